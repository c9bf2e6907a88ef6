//! Standard Security Handler implementation according to ISO 32000-1
//! Section 7.6.3, revisions 3 and 4 with 128-bit keys.

use super::aes::{aes_cbc_decrypt, aes_cbc_encrypt};
use super::encryption_dict::{EncryptionDictionary, EncryptionType};
use super::rc4::{rc4, Rc4};
use super::{DecryptionStatus, EncryptionError, Permissions};

/// Padding used in password processing
pub const PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Appended to the object key input for AES ("sAlT")
const AES_SALT: [u8; 4] = [0x73, 0x41, 0x6C, 0x54];

const KEY_LENGTH: usize = 16;

/// Number of MD5 re-hashes applied to the owner hash and the master key
const HASH_ROUNDS: usize = 50;

/// Number of RC4 passes over the owner and user values
const RC4_ROUNDS: u8 = 20;

/// Key derivation and object decryption for one encrypted document
#[derive(Debug, Clone)]
pub struct CryptoEngine {
    encryption_type: EncryptionType,
    document_id: Vec<u8>,
    owner_key: Vec<u8>,
    user_key: Vec<u8>,
    p: i32,
    encrypt_metadata: bool,
    master_key: Option<[u8; KEY_LENGTH]>,
}

impl CryptoEngine {
    pub fn new(dict: &EncryptionDictionary, document_id: Vec<u8>) -> Self {
        Self {
            encryption_type: dict.encryption_type,
            document_id,
            owner_key: dict.owner_key.clone(),
            user_key: dict.user_key.clone(),
            p: dict.p,
            encrypt_metadata: dict.encrypt_metadata,
            master_key: None,
        }
    }

    pub fn encryption_type(&self) -> EncryptionType {
        self.encryption_type
    }

    pub fn permissions(&self) -> Permissions {
        Permissions::from_p_value(self.p)
    }

    /// True once a password has been accepted
    pub fn has_key(&self) -> bool {
        self.master_key.is_some()
    }

    /// Try `password` as the owner password, then as the user password.
    /// On success the master key is kept for object decryption.
    pub fn test_password(&mut self, password: &str) -> Result<DecryptionStatus, EncryptionError> {
        let binary_password = process_password(password)?;

        let user_password = create_owner_key(&self.owner_key, &binary_password);
        let master_key = self.create_master_key(&user_password);
        if self.matches_user_key(&master_key) {
            self.master_key = Some(master_key);
            return Ok(DecryptionStatus::OwnerPassword);
        }

        let master_key = self.create_master_key(&binary_password);
        if self.matches_user_key(&master_key) {
            self.master_key = Some(master_key);
            return Ok(DecryptionStatus::UserPassword);
        }

        Ok(DecryptionStatus::InvalidPassword)
    }

    /// Only the first 16 bytes of `/U` are significant for revision 3 and up
    fn matches_user_key(&self, master_key: &[u8; KEY_LENGTH]) -> bool {
        let computed = create_user_key(master_key, &self.document_id);
        self.user_key.len() >= KEY_LENGTH && computed[..KEY_LENGTH] == self.user_key[..KEY_LENGTH]
    }

    fn create_master_key(&self, user_password: &[u8; 32]) -> [u8; KEY_LENGTH] {
        create_master_key(
            user_password,
            &self.owner_key,
            self.p,
            &self.document_id,
            self.encrypt_metadata,
        )
    }

    /// Per-object key: MD5 of the master key, the low three bytes of the object
    /// number, a zero generation and, for AES, the salt.
    pub fn object_key(&self, object_number: u32) -> Result<[u8; KEY_LENGTH], EncryptionError> {
        let master_key = self.master_key.ok_or(EncryptionError::NoKey)?;

        let mut data = Vec::with_capacity(KEY_LENGTH + 9);
        data.extend_from_slice(&master_key);
        data.extend_from_slice(&object_number.to_le_bytes()[..3]);
        data.extend_from_slice(&[0, 0]);
        if self.encryption_type == EncryptionType::Aes128 {
            data.extend_from_slice(&AES_SALT);
        }
        Ok(md5::compute(&data).0)
    }

    pub fn decrypt(&self, object_number: u32, data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let key = self.object_key(object_number)?;
        match self.encryption_type {
            EncryptionType::Aes128 => aes_cbc_decrypt(&key, data),
            EncryptionType::Standard128 => Ok(rc4(&key, data)),
            EncryptionType::Unsupported => Err(EncryptionError::UnsupportedHandler),
        }
    }

    /// AES output starts with a fresh random IV
    pub fn encrypt(&self, object_number: u32, data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let key = self.object_key(object_number)?;
        match self.encryption_type {
            EncryptionType::Aes128 => aes_cbc_encrypt(&key, data),
            EncryptionType::Standard128 => Ok(rc4(&key, data)),
            EncryptionType::Unsupported => Err(EncryptionError::UnsupportedHandler),
        }
    }
}

/// Convert a password to the 32 byte padded form. Characters above 255 have
/// no single byte encoding and are rejected.
pub fn process_password(password: &str) -> Result<[u8; 32], EncryptionError> {
    let mut padded = PADDING;
    let mut len = 0;
    for ch in password.chars().take(32) {
        let code = u32::from(ch);
        if code > 255 {
            return Err(EncryptionError::InvalidPasswordCharacter(ch));
        }
        padded[len] = code as u8;
        len += 1;
    }
    padded[len..].copy_from_slice(&PADDING[..32 - len]);
    Ok(padded)
}

/// RC4 the 32 byte `data` twenty times with keys derived from the owner
/// password. Encrypts the padded user password into `/O`, and because the
/// XOR keystreams commute, also recovers it from `/O`.
pub fn create_owner_key(data: &[u8], owner_password: &[u8; 32]) -> Vec<u8> {
    let mut hash = md5::compute(owner_password).0;
    for _ in 0..HASH_ROUNDS {
        hash = md5::compute(hash).0;
    }

    let mut result = data.to_vec();
    for round in 0..RC4_ROUNDS {
        let key: Vec<u8> = hash.iter().map(|b| b ^ round).collect();
        Rc4::new(&key).process_in_place(&mut result);
    }
    result
}

pub fn create_master_key(
    user_password: &[u8; 32],
    owner_key: &[u8],
    p: i32,
    document_id: &[u8],
    encrypt_metadata: bool,
) -> [u8; KEY_LENGTH] {
    let mut data = Vec::with_capacity(32 + owner_key.len() + 4 + document_id.len() + 4);
    data.extend_from_slice(user_password);
    data.extend_from_slice(owner_key);
    data.extend_from_slice(&p.to_le_bytes());
    data.extend_from_slice(document_id);
    if !encrypt_metadata {
        data.extend_from_slice(&[0xFF; 4]);
    }

    let mut hash = md5::compute(&data).0;
    for _ in 0..HASH_ROUNDS {
        hash = md5::compute(hash).0;
    }
    hash
}

/// `/U` value for a master key: 16 significant bytes followed by 16 zero bytes
pub fn create_user_key(master_key: &[u8; KEY_LENGTH], document_id: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(32 + document_id.len());
    data.extend_from_slice(&PADDING);
    data.extend_from_slice(document_id);
    let mut user_key = md5::compute(&data).0.to_vec();

    for round in 0..RC4_ROUNDS {
        let key: Vec<u8> = master_key.iter().map(|b| b ^ round).collect();
        Rc4::new(&key).process_in_place(&mut user_key);
    }
    user_key.resize(32, 0);
    user_key
}

/// `/O` and `/U` values for a new document with the given passwords
pub fn compute_password_entries(
    owner_password: &str,
    user_password: &str,
    p: i32,
    document_id: &[u8],
    encrypt_metadata: bool,
) -> Result<(Vec<u8>, Vec<u8>), EncryptionError> {
    let owner = process_password(owner_password)?;
    let user = process_password(user_password)?;
    let owner_key = create_owner_key(&user, &owner);
    let master_key = create_master_key(&user, &owner_key, p, document_id, encrypt_metadata);
    let user_key = create_user_key(&master_key, document_id);
    Ok((owner_key, user_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC_ID: [u8; 16] = [
        0x5B, 0x2A, 0x91, 0x03, 0x44, 0x10, 0xEF, 0x7C, 0x00, 0x19, 0xA8, 0x36, 0x62, 0xD5, 0x0E,
        0x81,
    ];

    fn engine(owner: &str, user: &str, encryption_type: EncryptionType) -> CryptoEngine {
        let p = Permissions::all().to_p_value();
        let (owner_key, user_key) = compute_password_entries(owner, user, p, &DOC_ID, true).unwrap();
        let dict = EncryptionDictionary {
            revision: 3,
            version: 2,
            length: 128,
            owner_key,
            user_key,
            p,
            encrypt_metadata: true,
            encryption_type,
        };
        CryptoEngine::new(&dict, DOC_ID.to_vec())
    }

    #[test]
    fn test_process_password() {
        assert_eq!(process_password("").unwrap(), PADDING);

        let padded = process_password("abc").unwrap();
        assert_eq!(&padded[..3], b"abc");
        assert_eq!(&padded[3..], &PADDING[..29]);

        let long = "x".repeat(40);
        assert_eq!(process_password(&long).unwrap(), [b'x'; 32]);

        assert_eq!(process_password("\u{e9}").unwrap()[0], 0xE9);
        assert!(matches!(
            process_password("\u{20ac}"),
            Err(EncryptionError::InvalidPasswordCharacter('\u{20ac}'))
        ));
    }

    #[test]
    fn test_owner_key_is_reversible() {
        let owner = process_password("owner").unwrap();
        let user = process_password("user").unwrap();
        let o_value = create_owner_key(&user, &owner);
        assert_ne!(o_value, user.to_vec());
        assert_eq!(create_owner_key(&o_value, &owner), user.to_vec());
    }

    #[test]
    fn test_user_key_layout() {
        let master = [7u8; KEY_LENGTH];
        let user_key = create_user_key(&master, &DOC_ID);
        assert_eq!(user_key.len(), 32);
        assert_eq!(&user_key[16..], &[0u8; 16]);
    }

    #[test]
    fn test_encrypt_metadata_changes_master_key() {
        let user = process_password("").unwrap();
        let with = create_master_key(&user, &[1; 32], -4, &DOC_ID, true);
        let without = create_master_key(&user, &[1; 32], -4, &DOC_ID, false);
        assert_ne!(with, without);
    }

    #[test]
    fn test_password_statuses() {
        let mut crypto = engine("owner", "user", EncryptionType::Standard128);
        assert!(!crypto.has_key());
        assert_eq!(crypto.test_password("owner").unwrap(), DecryptionStatus::OwnerPassword);
        assert!(crypto.has_key());
        assert_eq!(crypto.test_password("user").unwrap(), DecryptionStatus::UserPassword);
        assert_eq!(crypto.test_password("wrong").unwrap(), DecryptionStatus::InvalidPassword);
        assert_eq!(crypto.test_password("").unwrap(), DecryptionStatus::InvalidPassword);
    }

    #[test]
    fn test_empty_user_password_opens_as_user() {
        let mut crypto = engine("secret", "", EncryptionType::Standard128);
        assert_eq!(crypto.test_password("").unwrap(), DecryptionStatus::UserPassword);
    }

    #[test]
    fn test_empty_owner_password_opens_as_owner() {
        let mut crypto = engine("", "", EncryptionType::Standard128);
        assert_eq!(crypto.test_password("").unwrap(), DecryptionStatus::OwnerPassword);
    }

    // /O and /U for empty passwords, P = -4, R3, computed with an
    // independent MD5 and RC4
    const GOLDEN_OWNER: &str = "36451bd39d753b7c1d10922c28e6665aa4f3353fb0348b536893e3b1db5c579b";
    const GOLDEN_USER: &str = "144385084d51e10a79970f0b73d7ebe4";

    #[test]
    fn test_password_entries_golden_vector() {
        let (owner_key, user_key) = compute_password_entries("", "", -4, &DOC_ID, true).unwrap();
        assert_eq!(hex::encode(&owner_key), GOLDEN_OWNER);
        assert_eq!(hex::encode(&user_key[..16]), GOLDEN_USER);
    }

    #[test]
    fn test_golden_entries_open_with_empty_password() {
        let mut user_key = hex::decode(GOLDEN_USER).unwrap();
        user_key.resize(32, 0);
        let dict = EncryptionDictionary {
            revision: 3,
            version: 2,
            length: 128,
            owner_key: hex::decode(GOLDEN_OWNER).unwrap(),
            user_key,
            p: -4,
            encrypt_metadata: true,
            encryption_type: EncryptionType::Standard128,
        };
        let mut crypto = CryptoEngine::new(&dict, DOC_ID.to_vec());
        assert_eq!(crypto.test_password("").unwrap(), DecryptionStatus::OwnerPassword);
    }

    #[test]
    fn test_short_user_entry_never_matches() {
        let mut crypto = engine("", "", EncryptionType::Standard128);
        crypto.user_key.truncate(8);
        assert_eq!(crypto.test_password("").unwrap(), DecryptionStatus::InvalidPassword);
    }

    #[test]
    fn test_object_key_requires_password() {
        let crypto = engine("o", "u", EncryptionType::Standard128);
        assert!(matches!(crypto.object_key(1), Err(EncryptionError::NoKey)));
    }

    #[test]
    fn test_object_key_derivation() {
        let mut crypto = engine("o", "u", EncryptionType::Standard128);
        crypto.test_password("u").unwrap();
        let master = crypto.master_key.unwrap();

        let mut input = master.to_vec();
        input.extend_from_slice(&[0x34, 0x12, 0x00, 0, 0]);
        assert_eq!(crypto.object_key(0x1234).unwrap(), md5::compute(&input).0);

        crypto.encryption_type = EncryptionType::Aes128;
        input.extend_from_slice(b"sAlT");
        assert_eq!(crypto.object_key(0x1234).unwrap(), md5::compute(&input).0);
    }

    #[test]
    fn test_rc4_object_round_trip() {
        let mut crypto = engine("o", "u", EncryptionType::Standard128);
        crypto.test_password("o").unwrap();
        let cipher = crypto.encrypt(5, b"Hello").unwrap();
        assert_eq!(cipher.len(), 5);
        assert_ne!(cipher, b"Hello");
        assert_eq!(crypto.decrypt(5, &cipher).unwrap(), b"Hello");
        assert_ne!(crypto.decrypt(6, &cipher).unwrap(), b"Hello");
    }

    #[test]
    fn test_aes_object_round_trip() {
        let mut crypto = engine("o", "u", EncryptionType::Aes128);
        crypto.test_password("u").unwrap();
        let cipher = crypto.encrypt(9, b"stream data").unwrap();
        assert_eq!(cipher.len(), 32);
        assert_eq!(crypto.decrypt(9, &cipher).unwrap(), b"stream data");
    }
}
