//! PDF encryption support according to ISO 32000-1 Chapter 7.6
//!
//! This module implements the Standard Security Handler for RC4 128-bit
//! (revision 3) and AES-128 (revision 4) encrypted documents: password
//! verification, per-object key derivation and string/stream decryption.

mod aes;
mod encryption_dict;
mod permissions;
mod rc4;
mod standard_security;

pub use aes::{aes_cbc_decrypt, aes_cbc_encrypt, aes_cbc_encrypt_with_iv};
pub use encryption_dict::{CryptFilterMethod, EncryptionDictionary, EncryptionType};
pub use permissions::Permissions;
pub use rc4::{rc4, Rc4};
pub use standard_security::{
    compute_password_entries, create_master_key, create_owner_key, create_user_key,
    process_password, CryptoEngine, PADDING,
};

use thiserror::Error;

/// Outcome of opening a document with a password
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DecryptionStatus {
    /// The document has no `/Encrypt` entry
    FileNotProtected,
    /// The password matched the owner password
    OwnerPassword,
    /// The password matched the user password
    UserPassword,
    /// Neither password matched; another one may be tried
    InvalidPassword,
    /// The security handler is not supported; no password will work
    Unsupported,
}

impl DecryptionStatus {
    /// True when the document can be read
    pub fn is_readable(self) -> bool {
        matches!(
            self,
            DecryptionStatus::FileNotProtected
                | DecryptionStatus::OwnerPassword
                | DecryptionStatus::UserPassword
        )
    }
}

#[derive(Error, Debug)]
pub enum EncryptionError {
    #[error("Password character {0:?} is outside the range 0-255")]
    InvalidPasswordCharacter(char),

    #[error("No decryption key; the password has not been verified")]
    NoKey,

    #[error("Unsupported security handler")]
    UnsupportedHandler,

    #[error("Cipher error: {0}")]
    Cipher(String),
}
