//! Cryptographic operations for Xbox configuration data.
//!
//! All functions accept already-loaded buffers; the root key material lives
//! in [`crate::keys`]. HMAC-SHA1 comes from the `hmac`/`sha1` crates, RC4
//! from the `rc4` crate and 3DES-CBC from `des`/`cbc`; this module only wires
//! them together the way the console kernel does.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`eeprom`]  | HMAC-SHA1 tag + RC4 payload encryption of the 0x30-byte EEPROM encrypted section |
//! | [`account`] | HMAC-SHA1 signature + 3DES-CBC confounder encryption of a 0x6C-byte online account |
//!
//! ## Key hierarchy (brief)
//!
//! ```text
//! EEPROM root key (16 bytes, one per hardware generation)
//!   ├── HMAC-SHA1(payload)  → 20-byte tag stored in the clear
//!   └── HMAC-SHA1(tag)      → 20-byte RC4 key
//!                               └── RC4 over the 0x1C-byte payload
//!
//! Account seed (16 bytes; HDD key for machine-bound accounts)
//!   ├── HMAC-SHA1(seed key A)[..4]  ┐
//!   └── HMAC-SHA1(seed key B)       ┴→ 24-byte 3DES key → CBC over confounder[..0x10]
//! Account auth key (16 bytes; HDD key for machine-bound accounts)
//!   └── HMAC-SHA1(account[..0x64])[..8] → verification bytes
//! ```

use hmac::{Hmac, Mac};
use hmac::digest::KeyInit;
use hmac::digest::generic_array::GenericArray;
use hmac::digest::typenum::U64;
use sha1::Sha1;

pub mod account;
pub mod eeprom;

/// Length of every HMAC key the console uses.
pub(crate) const MAC_KEY_SIZE: usize = 0x10;
/// Length of an HMAC-SHA1 output.
pub(crate) const DIGEST_SIZE: usize = 0x14;

pub(crate) type HmacSha1 = Hmac<Sha1>;

// HMAC zero-pads any key shorter than the SHA-1 block (64 bytes), so a
// 16-byte key padded here yields the same MAC through the fixed-size
// constructor, which cannot fail.
pub(crate) fn new_mac(key: &[u8; MAC_KEY_SIZE]) -> HmacSha1 {
    let mut block = GenericArray::<u8, U64>::default();
    block[..MAC_KEY_SIZE].copy_from_slice(key);
    <HmacSha1 as KeyInit>::new(&block)
}

pub(crate) fn hmac_sha1(key: &[u8; MAC_KEY_SIZE], message: &[u8]) -> [u8; DIGEST_SIZE] {
    let mut mac = new_mac(key);
    mac.update(message);
    let mut out = [0u8; DIGEST_SIZE];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_key_matches_variable_length_constructor() {
        let key = [0x0Bu8; MAC_KEY_SIZE];
        let mut reference = <HmacSha1 as Mac>::new_from_slice(&key).unwrap();
        reference.update(b"Hi There");
        assert_eq!(
            hmac_sha1(&key, b"Hi There")[..],
            reference.finalize().into_bytes()[..]
        );
    }

    #[test]
    fn hmac_sha1_known_answer() {
        // RFC 2202 case 2 uses a 4-byte key; zero-padding it to 16 bytes is
        // the same key as far as HMAC is concerned.
        let mut key = [0u8; MAC_KEY_SIZE];
        key[..4].copy_from_slice(b"Jefe");
        assert_eq!(
            hmac_sha1(&key, b"what do ya want for nothing?"),
            [
                0xEF, 0xFC, 0xDF, 0x6A, 0xE5, 0xEB, 0x2F, 0xA2, 0xD2, 0x74, 0x16, 0xD5, 0xF1,
                0x84, 0xDF, 0x9C, 0x25, 0x9A, 0x7C, 0x79,
            ]
        );
    }
}
