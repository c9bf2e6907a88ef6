//! PDF encryption dictionary structures

use crate::encryption::Permissions;
use crate::parser::{PdfDictionary, PdfObject};

/// Cipher selected by the encryption dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EncryptionType {
    /// AES-128-CBC through the `/StdCF` crypt filter (R 4, V 4)
    Aes128,
    /// RC4 with a 128-bit key (R 3, V 2)
    Standard128,
    /// Anything else
    Unsupported,
}

/// Crypt filter method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptFilterMethod {
    /// No encryption
    None,
    /// RC4 encryption
    V2,
    /// AES-128 encryption
    AESV2,
}

impl CryptFilterMethod {
    /// Parse from a name such as `/AESV2`
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "/None" => Some(CryptFilterMethod::None),
            "/V2" => Some(CryptFilterMethod::V2),
            "/AESV2" => Some(CryptFilterMethod::AESV2),
            _ => None,
        }
    }
}

/// Standard security handler parameters read from `/Encrypt`
#[derive(Debug, Clone)]
pub struct EncryptionDictionary {
    /// `/R`
    pub revision: i32,
    /// `/V`
    pub version: i32,
    /// `/Length` in bits
    pub length: i32,
    /// `/O` owner password hash
    pub owner_key: Vec<u8>,
    /// `/U` user password hash
    pub user_key: Vec<u8>,
    /// `/P` raw permission bits
    pub p: i32,
    /// `/EncryptMetadata`, true when absent
    pub encrypt_metadata: bool,
    /// Cipher the entries above select
    pub encryption_type: EncryptionType,
}

impl EncryptionDictionary {
    /// Read the standard security handler entries. `None` means the dictionary
    /// does not describe a handler this crate can open.
    pub fn from_dict(dict: &PdfDictionary) -> Option<Self> {
        if dict.get_name("/Filter")? != "/Standard" {
            return None;
        }
        let length = dict.get_integer("/Length")?;
        if length != 128 {
            return None;
        }
        let p = dict.get_integer("/P")?;
        let owner_key = dict.get("/O")?.as_string()?.as_bytes().to_vec();
        let user_key = dict.get("/U")?.as_string()?.as_bytes().to_vec();
        let revision = dict.get_integer("/R")?;
        let version = dict.get_integer("/V")?;
        let encrypt_metadata = dict
            .get("/EncryptMetadata")
            .and_then(PdfObject::as_bool)
            .unwrap_or(true);

        let encryption_type = match (revision, version) {
            (4, 4) if is_std_aes_filter(dict) => EncryptionType::Aes128,
            (3, 2) => EncryptionType::Standard128,
            _ => return None,
        };

        Some(Self {
            revision,
            version,
            length,
            owner_key,
            user_key,
            p,
            encrypt_metadata,
            encryption_type,
        })
    }

    /// Classify a dictionary without keeping the parsed values
    pub fn support(dict: &PdfDictionary) -> EncryptionType {
        Self::from_dict(dict)
            .map(|parsed| parsed.encryption_type)
            .unwrap_or(EncryptionType::Unsupported)
    }

    pub fn permissions(&self) -> Permissions {
        Permissions::from_p_value(self.p)
    }
}

/// `/StrF` and `/StmF` both name `/StdCF`, which must be a 16 byte AESV2
/// filter authenticated on document open.
fn is_std_aes_filter(dict: &PdfDictionary) -> bool {
    if dict.get_name("/StrF") != Some("/StdCF") || dict.get_name("/StmF") != Some("/StdCF") {
        return false;
    }
    let Some(std_cf) = dict
        .get("/CF")
        .and_then(PdfObject::as_dict)
        .and_then(|cf| cf.get("/StdCF"))
        .and_then(PdfObject::as_dict)
    else {
        return false;
    };

    std_cf.get_integer("/Length") == Some(16)
        && std_cf.get_name("/AuthEvent") == Some("/DocOpen")
        && std_cf.get_name("/CFM").and_then(CryptFilterMethod::from_name)
            == Some(CryptFilterMethod::AESV2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{PdfName, PdfString};

    fn name(n: &str) -> PdfObject {
        PdfObject::Name(PdfName::new(n))
    }

    fn rc4_dict() -> PdfDictionary {
        let mut dict = PdfDictionary::new();
        dict.insert("/Filter", name("/Standard"));
        dict.insert("/Length", PdfObject::Integer(128));
        dict.insert("/P", PdfObject::Integer(-44));
        dict.insert("/O", PdfObject::String(PdfString::new(vec![1; 32])));
        dict.insert("/U", PdfObject::String(PdfString::new(vec![2; 32])));
        dict.insert("/R", PdfObject::Integer(3));
        dict.insert("/V", PdfObject::Integer(2));
        dict
    }

    fn aes_dict() -> PdfDictionary {
        let mut std_cf = PdfDictionary::new();
        std_cf.insert("/Length", PdfObject::Integer(16));
        std_cf.insert("/AuthEvent", name("/DocOpen"));
        std_cf.insert("/CFM", name("/AESV2"));
        let mut cf = PdfDictionary::new();
        cf.insert("/StdCF", PdfObject::Dictionary(std_cf));

        let mut dict = rc4_dict();
        dict.insert("/R", PdfObject::Integer(4));
        dict.insert("/V", PdfObject::Integer(4));
        dict.insert("/StrF", name("/StdCF"));
        dict.insert("/StmF", name("/StdCF"));
        dict.insert("/CF", PdfObject::Dictionary(cf));
        dict
    }

    #[test]
    fn test_rc4_128() {
        let parsed = EncryptionDictionary::from_dict(&rc4_dict()).unwrap();
        assert_eq!(parsed.encryption_type, EncryptionType::Standard128);
        assert_eq!(parsed.owner_key, vec![1; 32]);
        assert_eq!(parsed.p, -44);
        assert!(parsed.encrypt_metadata);
    }

    #[test]
    fn test_aes_128() {
        assert_eq!(EncryptionDictionary::support(&aes_dict()), EncryptionType::Aes128);
    }

    #[test]
    fn test_aes_requires_std_cf() {
        let mut dict = aes_dict();
        dict.insert("/StmF", name("/Identity"));
        assert_eq!(EncryptionDictionary::support(&dict), EncryptionType::Unsupported);

        let mut dict = aes_dict();
        dict.remove("/CF");
        assert_eq!(EncryptionDictionary::support(&dict), EncryptionType::Unsupported);
    }

    #[test]
    fn test_unsupported_configurations() {
        let mut dict = rc4_dict();
        dict.insert("/Length", PdfObject::Integer(40));
        assert_eq!(EncryptionDictionary::support(&dict), EncryptionType::Unsupported);

        let mut dict = rc4_dict();
        dict.insert("/Filter", name("/Adobe.PubSec"));
        assert_eq!(EncryptionDictionary::support(&dict), EncryptionType::Unsupported);

        let mut dict = rc4_dict();
        dict.insert("/R", PdfObject::Integer(6));
        dict.insert("/V", PdfObject::Integer(5));
        assert_eq!(EncryptionDictionary::support(&dict), EncryptionType::Unsupported);

        let mut dict = rc4_dict();
        dict.remove("/U");
        assert_eq!(EncryptionDictionary::support(&dict), EncryptionType::Unsupported);
    }

    #[test]
    fn test_encrypt_metadata_flag() {
        let mut dict = rc4_dict();
        dict.insert("/EncryptMetadata", PdfObject::Boolean(false));
        assert!(!EncryptionDictionary::from_dict(&dict).unwrap().encrypt_metadata);
    }
}
