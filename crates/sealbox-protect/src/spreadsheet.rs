//! Spreadsheet protection via ECMA-376 standard encryption.
//!
//! Wraps a workbook (the OOXML zip package, or a legacy binary workbook)
//! in an OLE2 compound file holding an `EncryptionInfo` stream and the
//! AES-encrypted package. Spreadsheet applications recognize the
//! container and require the password to open it.
//!
//! Scheme: the "standard" (ECMA-376 Part 2) variant, SHA-1 key
//! derivation with a 50 000-round spin, AES-128-ECB for the verifier and
//! the package body. The agile scheme is newer but the standard one is
//! the simplest the applications still accept.

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyInit};
use sha1::{Digest, Sha1};
use std::io::Write;
use std::path::Path;

use crate::error::Result;

type Aes128EcbEnc = ecb::Encryptor<aes::Aes128>;
type Aes128EcbDec = ecb::Decryptor<aes::Aes128>;

/// Key derivation spin count fixed by the standard scheme.
const SPIN_COUNT: u32 = 50_000;

/// AES-128 key size in bytes.
const KEY_LEN: usize = 16;

/// CSP name advertised in the encryption header (UTF-16LE, NUL-terminated).
const CSP_NAME: &str = "Microsoft Enhanced RSA and AES Cryptographic Provider";

/// ALG_ID for AES-128.
const ALG_ID_AES128: u32 = 0x0000_660E;
/// ALG_ID for SHA-1.
const ALG_ID_SHA1: u32 = 0x0000_8004;
/// fCryptoAPI | fAES header flags.
const HEADER_FLAGS: u32 = 0x0000_0024;

/// Derive the AES key from the password and salt (standard scheme).
fn derive_key(password: &str, salt: &[u8; 16]) -> [u8; KEY_LEN] {
    let pw_utf16: Vec<u8> = password
        .encode_utf16()
        .flat_map(|u| u.to_le_bytes())
        .collect();

    let mut hasher = Sha1::new();
    hasher.update(salt);
    hasher.update(&pw_utf16);
    let mut h = hasher.finalize();

    for i in 0..SPIN_COUNT {
        let mut hasher = Sha1::new();
        hasher.update(i.to_le_bytes());
        hasher.update(h);
        h = hasher.finalize();
    }

    // Final block increment, block number 0.
    let mut hasher = Sha1::new();
    hasher.update(h);
    hasher.update(0u32.to_le_bytes());
    let h_final = hasher.finalize();

    // CryptDeriveKey expansion with the 0x36 pad; one round suffices for
    // a 128-bit key.
    let mut buf = [0x36u8; 64];
    for (b, h) in buf.iter_mut().zip(h_final.iter()) {
        *b ^= h;
    }
    let x1 = Sha1::digest(buf);

    let mut key = [0u8; KEY_LEN];
    key.copy_from_slice(&x1[..KEY_LEN]);
    key
}

/// AES-128-ECB encrypt without padding; `data` must be block-aligned.
fn ecb_encrypt(key: &[u8; KEY_LEN], data: &[u8]) -> Vec<u8> {
    Aes128EcbEnc::new(key.into())
        .encrypt_padded_vec_mut::<NoPadding>(data)
}

/// AES-128-ECB decrypt without padding.
fn ecb_decrypt(key: &[u8; KEY_LEN], data: &[u8]) -> Vec<u8> {
    Aes128EcbDec::new(key.into())
        .decrypt_padded_vec_mut::<NoPadding>(data)
        .unwrap_or_default()
}

/// Build the EncryptionInfo stream bytes.
fn encryption_info(
    salt: &[u8; 16],
    encrypted_verifier: &[u8; 16],
    encrypted_verifier_hash: &[u8; 32],
) -> Vec<u8> {
    let csp: Vec<u8> = CSP_NAME
        .encode_utf16()
        .chain(std::iter::once(0u16))
        .flat_map(|u| u.to_le_bytes())
        .collect();

    // EncryptionHeader
    let mut header = Vec::new();
    header.extend_from_slice(&HEADER_FLAGS.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes()); // sizeExtra
    header.extend_from_slice(&ALG_ID_AES128.to_le_bytes());
    header.extend_from_slice(&ALG_ID_SHA1.to_le_bytes());
    header.extend_from_slice(&(8 * KEY_LEN as u32).to_le_bytes()); // keySize bits
    header.extend_from_slice(&0x0000_0018u32.to_le_bytes()); // providerType
    header.extend_from_slice(&0u32.to_le_bytes()); // reserved1
    header.extend_from_slice(&0u32.to_le_bytes()); // reserved2
    header.extend_from_slice(&csp);

    let mut info = Vec::new();
    info.extend_from_slice(&3u16.to_le_bytes()); // version major (standard)
    info.extend_from_slice(&2u16.to_le_bytes()); // version minor
    info.extend_from_slice(&HEADER_FLAGS.to_le_bytes());
    info.extend_from_slice(&(header.len() as u32).to_le_bytes());
    info.extend_from_slice(&header);

    // EncryptionVerifier
    info.extend_from_slice(&16u32.to_le_bytes()); // saltSize
    info.extend_from_slice(salt);
    info.extend_from_slice(encrypted_verifier);
    info.extend_from_slice(&20u32.to_le_bytes()); // verifierHashSize (SHA-1)
    info.extend_from_slice(encrypted_verifier_hash);

    info
}

/// Check a password against the verifier fields. Used by tests; the
/// consuming application performs the same check on open.
fn verify_password(
    password: &str,
    salt: &[u8; 16],
    encrypted_verifier: &[u8; 16],
    encrypted_verifier_hash: &[u8; 32],
) -> bool {
    let key = derive_key(password, salt);
    let verifier = ecb_decrypt(&key, encrypted_verifier);
    let hash = ecb_decrypt(&key, encrypted_verifier_hash);
    let expected = Sha1::digest(&verifier);
    hash.len() == 32 && hash[..20] == expected[..]
}

/// Protect a workbook: read from `source`, write the encrypted OLE2
/// container to `dest`.
pub fn protect(source: &Path, dest: &Path, password: &str) -> Result<()> {
    let package = std::fs::read(source)?;

    let mut salt = [0u8; 16];
    let mut verifier = [0u8; 16];
    {
        use rand::RngCore;
        let mut rng = rand::rngs::OsRng;
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut verifier);
    }

    let key = derive_key(password, &salt);

    let mut encrypted_verifier = [0u8; 16];
    encrypted_verifier.copy_from_slice(&ecb_encrypt(&key, &verifier));

    let mut verifier_hash = [0u8; 32];
    verifier_hash[..20].copy_from_slice(&Sha1::digest(verifier));
    let mut encrypted_verifier_hash = [0u8; 32];
    encrypted_verifier_hash.copy_from_slice(&ecb_encrypt(&key, &verifier_hash));

    let info = encryption_info(&salt, &encrypted_verifier, &encrypted_verifier_hash);

    // EncryptedPackage: real size prefix, then the block-padded body.
    let mut padded = package.clone();
    let rem = padded.len() % 16;
    if rem != 0 {
        padded.resize(padded.len() + (16 - rem), 0);
    }
    let mut encrypted_package = Vec::with_capacity(8 + padded.len());
    encrypted_package.extend_from_slice(&(package.len() as u64).to_le_bytes());
    encrypted_package.extend_from_slice(&ecb_encrypt(&key, &padded));

    let mut container = cfb::create(dest)?;
    {
        let mut stream = container.create_stream("/EncryptionInfo")?;
        stream.write_all(&info)?;
    }
    {
        let mut stream = container.create_stream("/EncryptedPackage")?;
        stream.write_all(&encrypted_package)?;
    }
    container.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_derive_key_is_deterministic() {
        let salt = [7u8; 16];
        assert_eq!(derive_key("pw", &salt), derive_key("pw", &salt));
        assert_ne!(derive_key("pw", &salt), derive_key("pw2", &salt));
        assert_ne!(derive_key("pw", &salt), derive_key("pw", &[8u8; 16]));
    }

    #[test]
    fn test_verifier_accepts_right_password_only() {
        let salt = [3u8; 16];
        let verifier = [9u8; 16];
        let key = derive_key("open sesame", &salt);

        let mut enc_verifier = [0u8; 16];
        enc_verifier.copy_from_slice(&ecb_encrypt(&key, &verifier));

        let mut hash = [0u8; 32];
        hash[..20].copy_from_slice(&Sha1::digest(verifier));
        let mut enc_hash = [0u8; 32];
        enc_hash.copy_from_slice(&ecb_encrypt(&key, &hash));

        assert!(verify_password("open sesame", &salt, &enc_verifier, &enc_hash));
        assert!(!verify_password("open sesamE", &salt, &enc_verifier, &enc_hash));
        assert!(!verify_password("", &salt, &enc_verifier, &enc_hash));
    }

    #[test]
    fn test_protect_writes_container_streams() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.xlsx");
        let dest = dir.path().join("book.protected.xlsx");
        std::fs::write(&source, b"PK\x03\x04 fake workbook package").unwrap();

        protect(&source, &dest, "pw123").unwrap();

        let mut container = cfb::open(&dest).unwrap();
        assert!(container.exists("/EncryptionInfo"));
        assert!(container.exists("/EncryptedPackage"));

        // Package body must be encrypted: size prefix intact, bytes differ.
        let mut package = Vec::new();
        container
            .open_stream("/EncryptedPackage")
            .unwrap()
            .read_to_end(&mut package)
            .unwrap();
        let size = u64::from_le_bytes(package[..8].try_into().unwrap());
        assert_eq!(size, 26);
        assert!(!package[8..].starts_with(b"PK"));
    }

    #[test]
    fn test_encryption_info_layout() {
        let info = encryption_info(&[0u8; 16], &[1u8; 16], &[2u8; 32]);

        // Version 3.2, standard flags.
        assert_eq!(&info[0..2], &3u16.to_le_bytes());
        assert_eq!(&info[2..4], &2u16.to_le_bytes());
        assert_eq!(&info[4..8], &HEADER_FLAGS.to_le_bytes());
    }
}
