//! Cryptographic helpers for the EEPROM encrypted section.
//!
//! ## Layout (0x30 bytes)
//! ```text
//! [0x00] Checksum    - HMAC-SHA1 tag, stored in the clear (0x14 bytes)
//! [0x14] Confounder  - encrypted, opaque                  (8 bytes)
//! [0x1C] HDD key     - encrypted                          (0x10 bytes)
//! [0x2C] Game region - encrypted                          (u32 LE)
//! ```
//!
//! The 0x1C bytes after the tag are the payload and are always transformed
//! as one RC4 stream.
//!
//! ## Decryption
//!
//! The image does not say which root key was used, so each generation is
//! tried in the fixed order Gen1, Gen2, Gen3:
//!
//! 1. `rc4_key = HMAC-SHA1(root, tag)`
//! 2. `plaintext = RC4(rc4_key, payload)`
//! 3. accept if `HMAC-SHA1(root, plaintext) == tag`
//!
//! The first generation that verifies wins. Every attempt starts from the
//! original ciphertext, and the caller's buffer is only written once a
//! generation has verified.
//!
//! ## Encryption
//!
//! `tag = HMAC-SHA1(root, plaintext)`, then `rc4_key = HMAC-SHA1(root, tag)`.
//! The RC4 key is derived from the freshly computed tag, which is exactly
//! what decryption reads back from the stored tag.

use hmac::Mac;
use log::{debug, trace};
use rc4::cipher::generic_array::GenericArray;
use rc4::consts::U20;
use rc4::{KeyInit, Rc4, StreamCipher};

use super::{DIGEST_SIZE, hmac_sha1, new_mac};
use crate::keys::{KeyGeneration, ROOT_KEY_SIZE};
use crate::{Error, Result};

/// Size of the encrypted section in bytes.
pub const SECTION_SIZE: usize = 0x30;
/// Size of the stored HMAC-SHA1 tag.
pub const TAG_SIZE: usize = DIGEST_SIZE;
/// Size of the RC4-transformed payload following the tag.
pub const PAYLOAD_SIZE: usize = SECTION_SIZE - TAG_SIZE;

/// A generation paired with the root key it is tried with.
type Candidate = (KeyGeneration, &'static [u8; ROOT_KEY_SIZE]);

const CANDIDATES: [Candidate; 3] = [
    (KeyGeneration::Gen1, KeyGeneration::Gen1.root_key()),
    (KeyGeneration::Gen2, KeyGeneration::Gen2.root_key()),
    (KeyGeneration::Gen3, KeyGeneration::Gen3.root_key()),
];

fn rc4_apply(rc4_key: &[u8; TAG_SIZE], data: &mut [u8]) {
    let mut rc4 = Rc4::<U20>::new(GenericArray::from_slice(rc4_key));
    rc4.apply_keystream(data);
}

fn payload_of(section: &[u8; SECTION_SIZE]) -> [u8; PAYLOAD_SIZE] {
    std::array::from_fn(|i| section[TAG_SIZE + i])
}

// Returns the verified plaintext payload, or `None` if `root_key` does not
// reproduce the stored tag. `section` is only read.
fn try_candidate(
    section: &[u8; SECTION_SIZE],
    root_key: &[u8; ROOT_KEY_SIZE],
) -> Option<[u8; PAYLOAD_SIZE]> {
    let tag = &section[..TAG_SIZE];
    let rc4_key = hmac_sha1(root_key, tag);

    let mut plaintext = payload_of(section);
    rc4_apply(&rc4_key, &mut plaintext);

    let mut mac = new_mac(root_key);
    mac.update(&plaintext);
    mac.verify_slice(tag).ok().map(|()| plaintext)
}

fn decrypt_with(section: &mut [u8; SECTION_SIZE], candidates: &[Candidate]) -> Result<KeyGeneration> {
    for &(generation, root_key) in candidates {
        if let Some(plaintext) = try_candidate(section, root_key) {
            section[TAG_SIZE..].copy_from_slice(&plaintext);
            debug!("encrypted section verified with {generation}");
            return Ok(generation);
        }
        trace!("encrypted section did not verify with {generation}");
    }
    Err(Error::VerificationFailed)
}

/// Decrypt an encrypted section in place.
///
/// Tries every [`KeyGeneration`] in priority order and returns the first one
/// whose HMAC-SHA1 tag matches the stored tag. On success the payload
/// (confounder, HDD key and game region) is replaced with plaintext; the tag
/// is left as stored.
///
/// Returns [`Error::VerificationFailed`] if no generation verifies, in which
/// case `section` is unchanged.
pub fn decrypt_section(section: &mut [u8; SECTION_SIZE]) -> Result<KeyGeneration> {
    decrypt_with(section, &CANDIDATES)
}

/// Encrypt a plaintext section in place with the given key generation.
///
/// The existing tag bytes are ignored and overwritten with the HMAC-SHA1 of
/// the plaintext payload.
pub fn encrypt_section(section: &mut [u8; SECTION_SIZE], generation: KeyGeneration) {
    let root_key = generation.root_key();
    let mut payload = payload_of(section);

    let tag = hmac_sha1(root_key, &payload);
    let rc4_key = hmac_sha1(root_key, &tag);
    rc4_apply(&rc4_key, &mut payload);

    section[..TAG_SIZE].copy_from_slice(&tag);
    section[TAG_SIZE..].copy_from_slice(&payload);
    debug!("encrypted section with {generation}");
}

/// Encrypt a plaintext section in place with a numeric key version (1-3).
///
/// Returns [`Error::InvalidGeneration`] for any other version, leaving
/// `section` unchanged.
pub fn encrypt_section_with_version(section: &mut [u8; SECTION_SIZE], version: u8) -> Result<()> {
    let generation = KeyGeneration::try_from(version)?;
    encrypt_section(section, generation);
    Ok(())
}
