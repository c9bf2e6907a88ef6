//! AES-128-CBC for the AESV2 crypt filter
//!
//! Encrypted strings and streams carry a 16 byte initialization vector in
//! front of the cipher text and use PKCS#7 padding (ISO 32000-1 Section 7.6.2).

use super::EncryptionError;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;
type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

pub const BLOCK_SIZE: usize = 16;

/// Decrypt `IV || cipher text`
pub fn aes_cbc_decrypt(key: &[u8], data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    if data.len() < BLOCK_SIZE {
        return Err(EncryptionError::Cipher(format!(
            "AES data shorter than the initialization vector: {} bytes",
            data.len()
        )));
    }
    let (iv, cipher_text) = data.split_at(BLOCK_SIZE);
    if cipher_text.is_empty() {
        return Ok(Vec::new());
    }
    if cipher_text.len() % BLOCK_SIZE != 0 {
        return Err(EncryptionError::Cipher(format!(
            "AES cipher text length {} is not a multiple of {BLOCK_SIZE}",
            cipher_text.len()
        )));
    }

    let decryptor = Aes128CbcDec::new_from_slices(key, iv)
        .map_err(|_| EncryptionError::Cipher(format!("Invalid AES key length {}", key.len())))?;
    let mut buffer = cipher_text.to_vec();
    let plain_len = decryptor
        .decrypt_padded_mut::<Pkcs7>(&mut buffer)
        .map_err(|_| EncryptionError::Cipher("Invalid AES padding".to_string()))?
        .len();
    buffer.truncate(plain_len);
    Ok(buffer)
}

/// Encrypt with a fresh random IV, returned in front of the cipher text
pub fn aes_cbc_encrypt(key: &[u8], data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
    let iv: [u8; BLOCK_SIZE] = rand::random();
    aes_cbc_encrypt_with_iv(key, &iv, data)
}

pub fn aes_cbc_encrypt_with_iv(
    key: &[u8],
    iv: &[u8; BLOCK_SIZE],
    data: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    let encryptor = Aes128CbcEnc::new_from_slices(key, iv)
        .map_err(|_| EncryptionError::Cipher(format!("Invalid AES key length {}", key.len())))?;

    let padded_len = (data.len() / BLOCK_SIZE + 1) * BLOCK_SIZE;
    let mut buffer = vec![0u8; padded_len];
    buffer[..data.len()].copy_from_slice(data);
    let cipher_len = encryptor
        .encrypt_padded_mut::<Pkcs7>(&mut buffer, data.len())
        .map_err(|_| EncryptionError::Cipher("AES padding failed".to_string()))?
        .len();
    buffer.truncate(cipher_len);

    let mut output = Vec::with_capacity(BLOCK_SIZE + buffer.len());
    output.extend_from_slice(iv);
    output.extend_from_slice(&buffer);
    Ok(output)
}
