//! PDF protection via the standard security handler.
//!
//! Rewrites a PDF so that viewers require the user password on open and
//! enforce a restriction set: printing and accessibility extraction stay
//! allowed; modification, copying, annotation, form-filling, and assembly
//! are denied. Uses the revision 3 handler (RC4, 128-bit keys): owner and
//! user values per PDF 1.7 Algorithms 3.2-3.5, per-object keys derived
//! from the object and generation numbers.
//!
//! The owner password is derived from the user password with a fixed
//! suffix so the system can administratively re-open the file.

use lopdf::{Dictionary, Document, Object, StringFormat};
use md5::{Digest, Md5};
use std::path::Path;

use crate::error::{ProtectError, Result};

/// Suffix appended to the user password to form the owner password.
pub const OWNER_SUFFIX: &str = "_owner";

/// Standard padding string from the PDF specification (Algorithm 3.2).
const PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01,
    0x08, 0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53,
    0x69, 0x7A,
];

/// Permission bits (1-indexed per the PDF specification, revision 3).
const PERM_PRINT: u32 = 1 << 2;
const PERM_MODIFY: u32 = 1 << 3;
const PERM_COPY: u32 = 1 << 4;
const PERM_ANNOTATE: u32 = 1 << 5;
const PERM_FILL_FORMS: u32 = 1 << 8;
const PERM_ACCESSIBILITY: u32 = 1 << 9;
const PERM_ASSEMBLE: u32 = 1 << 10;
const PERM_PRINT_HIGH: u32 = 1 << 11;

/// The enforced restriction set: print + accessibility allowed, the rest
/// denied. Reserved low bits cleared per the specification.
pub const fn permission_flags() -> i32 {
    let denied = PERM_MODIFY | PERM_COPY | PERM_ANNOTATE | PERM_FILL_FORMS | PERM_ASSEMBLE;
    let allowed_base = !0u32 & !0b11; // reserved bits 1-2 are zero
    ((allowed_base & !denied) | PERM_PRINT | PERM_ACCESSIBILITY | PERM_PRINT_HIGH) as i32
}

/// RC4 stream cipher.
///
/// Only used for the PDF standard security handler; the generic
/// protection path uses AES-256-CBC from sealbox-core.
struct Rc4 {
    s: [u8; 256],
}

impl Rc4 {
    fn new(key: &[u8]) -> Self {
        let mut s = [0u8; 256];
        for (i, v) in s.iter_mut().enumerate() {
            *v = i as u8;
        }
        let mut j: u8 = 0;
        for i in 0..256 {
            j = j
                .wrapping_add(s[i])
                .wrapping_add(key[i % key.len()]);
            s.swap(i, j as usize);
        }
        Self { s }
    }

    fn process(&mut self, data: &[u8]) -> Vec<u8> {
        let mut i: u8 = 0;
        let mut j: u8 = 0;
        let mut out = Vec::with_capacity(data.len());
        for &byte in data {
            i = i.wrapping_add(1);
            j = j.wrapping_add(self.s[i as usize]);
            self.s.swap(i as usize, j as usize);
            let k = self.s[(self.s[i as usize].wrapping_add(self.s[j as usize])) as usize];
            out.push(byte ^ k);
        }
        out
    }
}

fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    Rc4::new(key).process(data)
}

/// Pad or truncate a password to exactly 32 bytes (Algorithm 3.2 step 1).
fn pad_password(password: &str) -> [u8; 32] {
    let bytes = password.as_bytes();
    let mut padded = [0u8; 32];
    let n = bytes.len().min(32);
    padded[..n].copy_from_slice(&bytes[..n]);
    padded[n..].copy_from_slice(&PAD[..32 - n]);
    padded
}

/// Compute the /O value (Algorithm 3.3, revision 3).
fn compute_owner_value(owner_password: &str, user_password: &str) -> [u8; 32] {
    let mut digest = Md5::digest(pad_password(owner_password));
    for _ in 0..50 {
        digest = Md5::digest(digest);
    }
    let rc4_key = &digest[..16];

    let mut value = pad_password(user_password).to_vec();
    value = rc4(rc4_key, &value);
    for i in 1..=19u8 {
        let key: Vec<u8> = rc4_key.iter().map(|b| b ^ i).collect();
        value = rc4(&key, &value);
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&value);
    out
}

/// Compute the file encryption key (Algorithm 3.2, revision 3, 128-bit).
fn compute_encryption_key(user_password: &str, o: &[u8; 32], p: i32, id: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(pad_password(user_password));
    hasher.update(o);
    hasher.update(p.to_le_bytes());
    hasher.update(id);
    let mut digest = hasher.finalize();

    for _ in 0..50 {
        digest = Md5::digest(&digest[..16]);
    }

    let mut key = [0u8; 16];
    key.copy_from_slice(&digest[..16]);
    key
}

/// Compute the /U value (Algorithm 3.5, revision 3).
fn compute_user_value(key: &[u8; 16], id: &[u8]) -> [u8; 32] {
    let mut hasher = Md5::new();
    hasher.update(PAD);
    hasher.update(id);
    let digest = hasher.finalize();

    let mut value = rc4(key, &digest[..16]);
    for i in 1..=19u8 {
        let step_key: Vec<u8> = key.iter().map(|b| b ^ i).collect();
        value = rc4(&step_key, &value);
    }

    // The second half is arbitrary padding per the specification.
    let mut out = [0u8; 32];
    out[..16].copy_from_slice(&value);
    out
}

/// Derive the per-object RC4 key (Algorithm 3.1).
fn object_key(file_key: &[u8; 16], obj_num: u32, gen_num: u16) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(file_key);
    hasher.update(&obj_num.to_le_bytes()[..3]);
    hasher.update(&gen_num.to_le_bytes()[..2]);
    let digest = hasher.finalize();

    let mut key = [0u8; 16];
    key.copy_from_slice(&digest[..16]);
    key
}

/// Encrypt every string and stream in an object in place.
fn encrypt_object(obj: &mut Object, key: &[u8; 16]) {
    match obj {
        Object::String(bytes, format) => {
            *bytes = rc4(key, bytes);
            *format = StringFormat::Hexadecimal;
        }
        Object::Array(items) => {
            for item in items.iter_mut() {
                encrypt_object(item, key);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                encrypt_object(value, key);
            }
        }
        Object::Stream(stream) => {
            // Strings inside stream dictionaries are encrypted too.
            for (_, value) in stream.dict.iter_mut() {
                encrypt_object(value, key);
            }
            let encrypted = rc4(key, &stream.content);
            stream.set_content(encrypted);
        }
        _ => {}
    }
}

/// Fetch the first document ID string from the trailer, creating one
/// when the source document has none.
fn document_id(doc: &mut Document, source: &Path) -> Vec<u8> {
    if let Ok(Object::Array(ids)) = doc.trailer.get(b"ID") {
        if let Some(Object::String(bytes, _)) = ids.first() {
            return bytes.clone();
        }
    }

    let mut hasher = Md5::new();
    hasher.update(source.to_string_lossy().as_bytes());
    hasher.update(now_millis().to_le_bytes());
    let id: Vec<u8> = hasher.finalize().to_vec();

    doc.trailer.set(
        "ID",
        Object::Array(vec![
            Object::String(id.clone(), StringFormat::Hexadecimal),
            Object::String(id.clone(), StringFormat::Hexadecimal),
        ]),
    );
    id
}

/// Protect a PDF: read from `source`, write the password-gated document
/// to `dest`.
///
/// The user password opens the document under the restriction set; the
/// owner password is `user_password + "_owner"`.
pub fn protect(source: &Path, dest: &Path, user_password: &str) -> Result<()> {
    let mut doc = Document::load(source)?;

    if doc.trailer.get(b"Encrypt").is_ok() {
        return Err(ProtectError::AlreadyEncrypted);
    }

    let owner_password = format!("{user_password}{OWNER_SUFFIX}");
    let p = permission_flags();

    let id = document_id(&mut doc, source);
    let o = compute_owner_value(&owner_password, user_password);
    let file_key = compute_encryption_key(user_password, &o, p, &id);
    let u = compute_user_value(&file_key, &id);

    // Encrypt all strings and stream contents. The Encrypt dictionary is
    // added afterwards so it never encrypts itself.
    let object_ids: Vec<(u32, u16)> = doc.objects.keys().copied().collect();
    for (num, gen) in object_ids {
        let key = object_key(&file_key, num, gen);
        if let Some(obj) = doc.objects.get_mut(&(num, gen)) {
            encrypt_object(obj, &key);
        }
    }

    let mut encrypt_dict = Dictionary::new();
    encrypt_dict.set("Filter", Object::Name(b"Standard".to_vec()));
    encrypt_dict.set("V", Object::Integer(2));
    encrypt_dict.set("R", Object::Integer(3));
    encrypt_dict.set("Length", Object::Integer(128));
    encrypt_dict.set("P", Object::Integer(p as i64));
    encrypt_dict.set("O", Object::String(o.to_vec(), StringFormat::Hexadecimal));
    encrypt_dict.set("U", Object::String(u.to_vec(), StringFormat::Hexadecimal));

    let encrypt_id = doc.add_object(Object::Dictionary(encrypt_dict));
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));

    doc.save(dest)?;
    Ok(())
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

/// Build a minimal single-page PDF. Test helper shared with the
/// dispatcher tests.
#[cfg(test)]
pub(crate) fn minimal_pdf(path: &Path) {
    use lopdf::content::{Content, Operation};
    use lopdf::Stream;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tj", vec![Object::string_literal("hello")]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content.encode().unwrap(),
    ));

    let mut page = Dictionary::new();
    page.set("Type", Object::Name(b"Page".to_vec()));
    page.set("Parent", Object::Reference(pages_id));
    page.set("Contents", Object::Reference(content_id));
    let page_id = doc.add_object(Object::Dictionary(page));

    let mut pages = Dictionary::new();
    pages.set("Type", Object::Name(b"Pages".to_vec()));
    pages.set("Kids", Object::Array(vec![Object::Reference(page_id)]));
    pages.set("Count", Object::Integer(1));
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).unwrap();
}
