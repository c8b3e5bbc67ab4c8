//! **xbkit** - a reusable Rust library for original Xbox configuration data.
//!
//! # Modules
//! | Module | Purpose |
//! |--------|---------|
//! | [`checksum`]        | XConfigChecksum rolling 32-bit checksum |
//! | [`crypto::eeprom`]  | HMAC-SHA1 / RC4 encrypted-section cipher with key-generation trial |
//! | [`crypto::account`] | HMAC-SHA1 / 3DES-CBC online account signing and verification |
//! | [`keys`]            | Compiled-in EEPROM root keys, one per hardware generation |
//! | [`formats::eeprom`] | Typed view of the 256-byte EEPROM image |
//! | [`formats::account`] | Typed online account record |
//! | [`formats::fatx`]   | FATX superblock, directory entries and naming rules |
//! | [`formats::hdd`]    | Refurb and config sectors of the hard disk |
//!
//! The library logs through the [`log`] facade and never installs a logger.

pub mod checksum;
pub mod crypto;
pub mod error;
pub mod formats;
pub mod keys;
pub(crate) mod utils;

pub use error::{Error, Result};
pub use keys::KeyGeneration;
