//! Wallet keystore for the TaskLedger client.
//!
//! This module handles Ed25519 keypair generation, storage, and write
//! authorization. Keys are stored in the wallet directory (`~/.taskledger/`
//! by default):
//!
//! - `key.priv`: Raw 32-byte Ed25519 seed (file mode 0600)
//! - `key.pub`: Base64-encoded public key (file mode 0644)
//!
//! The account address is derived from the verifying key: the first 20
//! bytes of its SHA-256 digest, hex-encoded with a `0x` prefix.
//!
//! # Example
//!
//! ```no_run
//! use taskledger_client::wallet::Wallet;
//! use std::path::Path;
//!
//! // Generate and save a new keypair
//! let wallet = Wallet::generate();
//! wallet.save(Path::new("/home/user/.taskledger")).unwrap();
//!
//! // Load an existing keypair
//! let wallet = Wallet::load(Path::new("/home/user/.taskledger")).unwrap();
//! println!("Account: {}", wallet.address());
//! ```

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use base64::prelude::*;
use ed25519_dalek::{Signer, SigningKey};
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroize;

use crate::types::Address;

/// Private key filename.
const PRIVATE_KEY_FILE: &str = "key.priv";

/// Public key filename.
const PUBLIC_KEY_FILE: &str = "key.pub";

/// Length of an Ed25519 seed (private key material).
const SEED_LENGTH: usize = 32;

/// Environment variable name for the private key.
const ENV_PRIVATE_KEY: &str = "TASKLEDGER_PRIVATE_KEY";

/// Indicates where the private key was loaded from.
///
/// Logged at INFO level on session establishment so users can verify which
/// key source is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Key loaded from the `TASKLEDGER_PRIVATE_KEY` environment variable.
    EnvironmentVariable,
    /// Key loaded from file at the given path.
    File(PathBuf),
}

/// Errors that can occur during wallet operations.
#[derive(Error, Debug)]
pub enum WalletError {
    /// I/O error during key file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid key format or length.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Environment variable not set or empty.
    #[error("environment variable not set: {0}")]
    EnvVar(String),
}

/// An Ed25519 wallet keypair.
///
/// The wallet is the signing capability behind the client's session: it
/// derives the account address and authorizes write submissions.
#[derive(Debug, Clone)]
pub struct Wallet {
    signing_key: SigningKey,
}

impl Wallet {
    /// Generates a new Ed25519 keypair using the operating system's
    /// cryptographically secure random number generator.
    #[must_use]
    pub fn generate() -> Self {
        let mut seed = [0u8; SEED_LENGTH];
        rand::rng().fill(&mut seed);
        let wallet = Self::from_seed(&seed);
        seed.zeroize();
        wallet
    }

    /// Builds a wallet from a raw 32-byte seed.
    fn from_seed(seed: &[u8; SEED_LENGTH]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Builds a wallet from a base64-encoded seed, zeroizing intermediate
    /// key material on both the success and error paths.
    fn from_seed_base64(encoded: &str) -> Result<Self, WalletError> {
        let mut decoded = BASE64_STANDARD.decode(encoded.trim())?;

        if decoded.len() != SEED_LENGTH {
            let len = decoded.len();
            decoded.zeroize();
            return Err(WalletError::InvalidKey(format!(
                "expected {SEED_LENGTH} bytes, got {len}"
            )));
        }

        let mut seed = [0u8; SEED_LENGTH];
        seed.copy_from_slice(&decoded);
        decoded.zeroize();

        let wallet = Self::from_seed(&seed);
        seed.zeroize();
        Ok(wallet)
    }

    /// Loads a keypair, trying the environment variable first, then the file.
    ///
    /// Key precedence:
    /// 1. If `TASKLEDGER_PRIVATE_KEY` is set, it is used. If its value is
    ///    invalid, an error is returned without falling back to the file.
    /// 2. Otherwise the key is loaded from `{dir}/key.priv`.
    ///
    /// Returns the `Wallet` and the `KeySource` it was loaded from.
    ///
    /// # Errors
    ///
    /// Returns `WalletError` if the env var is set but invalid, or if it is
    /// not set and the file is missing or malformed.
    pub fn load_with_fallback(dir: &Path) -> Result<(Self, KeySource), WalletError> {
        match std::env::var(ENV_PRIVATE_KEY) {
            Ok(value) => {
                if value.trim().is_empty() {
                    return Err(WalletError::EnvVar(ENV_PRIVATE_KEY.to_string()));
                }
                let wallet = Self::from_seed_base64(&value)?;
                Ok((wallet, KeySource::EnvironmentVariable))
            }
            Err(_) => {
                let priv_path = dir.join(PRIVATE_KEY_FILE);
                let wallet = Self::load(dir)?;
                Ok((wallet, KeySource::File(priv_path)))
            }
        }
    }

    /// Loads an existing keypair from a directory.
    ///
    /// Reads the private key from `{dir}/key.priv`, which must contain
    /// exactly 32 bytes (the Ed25519 seed).
    ///
    /// # Errors
    ///
    /// Returns `WalletError` if the key file doesn't exist, cannot be read,
    /// or doesn't contain exactly 32 bytes.
    pub fn load(dir: &Path) -> Result<Self, WalletError> {
        let priv_path = dir.join(PRIVATE_KEY_FILE);

        let mut file = File::open(&priv_path)?;
        let mut seed = [0u8; SEED_LENGTH];
        let bytes_read = file.read(&mut seed)?;

        if bytes_read != SEED_LENGTH {
            seed.zeroize();
            return Err(WalletError::InvalidKey(format!(
                "expected {SEED_LENGTH} bytes, got {bytes_read}"
            )));
        }

        let wallet = Self::from_seed(&seed);
        seed.zeroize();
        Ok(wallet)
    }

    /// Saves the keypair to a directory, creating it if needed.
    ///
    /// Writes `key.priv` (raw seed, mode 0600) and `key.pub` (base64,
    /// mode 0644).
    ///
    /// # Errors
    ///
    /// Returns `WalletError` if the directory cannot be created or the key
    /// files cannot be written.
    pub fn save(&self, dir: &Path) -> Result<(), WalletError> {
        fs::create_dir_all(dir)?;

        let priv_path = dir.join(PRIVATE_KEY_FILE);
        let mut priv_file = File::create(&priv_path)?;
        priv_file.write_all(self.signing_key.to_bytes().as_slice())?;

        // Private key must not be world-readable
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&priv_path, fs::Permissions::from_mode(0o600))?;
        }

        let pub_path = dir.join(PUBLIC_KEY_FILE);
        let mut pub_file = File::create(&pub_path)?;
        pub_file.write_all(self.public_key_base64().as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&pub_path, fs::Permissions::from_mode(0o644))?;
        }

        Ok(())
    }

    /// Returns true if a private key file exists in the directory.
    #[must_use]
    pub fn exists(dir: &Path) -> bool {
        dir.join(PRIVATE_KEY_FILE).is_file()
    }

    /// Returns true if key material is available from either source: the
    /// `TASKLEDGER_PRIVATE_KEY` environment variable or a key file in `dir`.
    #[must_use]
    pub fn available(dir: &Path) -> bool {
        std::env::var(ENV_PRIVATE_KEY).is_ok_and(|v| !v.trim().is_empty()) || Self::exists(dir)
    }

    /// Returns the account address controlled by this wallet.
    ///
    /// The address is the first 20 bytes of the SHA-256 digest of the
    /// verifying key, hex-encoded with a `0x` prefix.
    #[must_use]
    pub fn address(&self) -> Address {
        let digest = Sha256::digest(self.signing_key.verifying_key().as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[..20]);
        Address::from_bytes(&bytes)
    }

    /// Returns the base64-encoded public key.
    #[must_use]
    pub fn public_key_base64(&self) -> String {
        BASE64_STANDARD.encode(self.signing_key.verifying_key().as_bytes())
    }

    /// Returns the base64-encoded private key seed.
    ///
    /// Used by `taskledger account --export` to move a wallet into CI
    /// secrets; never logged.
    #[must_use]
    pub fn seed_base64(&self) -> String {
        BASE64_STANDARD.encode(self.signing_key.to_bytes())
    }

    /// Signs a message and returns the base64-encoded signature.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> String {
        let signature = self.signing_key.sign(message);
        BASE64_STANDARD.encode(signature.to_bytes())
    }
}
