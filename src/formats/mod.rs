//! Parsers for Xbox binary formats.
//!
//! Parsers follow the same conventions:
//!
//! * **Generic over** [`std::io::Read`] - pass a [`std::fs::File`], a
//!   [`std::io::Cursor`], a byte slice, or anything else that implements it.
//!   Fixed-size images also have a `from_bytes` constructor.
//! * **Crypto is separate** - the cipher lives in [`crate::crypto`]; parsers
//!   call into it and hand back plaintext structures.
//! * **Writers mirror parsers** - every section has a `to_bytes` that
//!   reproduces the exact on-disk layout.
//! * **Signed records verify on parse** - [`eeprom`] and [`account`] reject
//!   data that does not verify and sign again on write. Account keys are
//!   passed in since machine accounts are bound to one console.
//!
//! ## Format overview
//!
//! | Module      | Format | Description |
//! |-------------|--------|-------------|
//! | [`eeprom`]  | EEPROM | 256-byte console configuration image: encrypted secrets, factory data, user settings |
//! | [`account`] | Online account | 0x6C-byte signed Xbox LIVE account record |
//! | [`fatx`]    | FATX | File system superblock, directory entries, timestamps and name rules |
//! | [`hdd`]     | HDD sectors | Refurb info and config sectors at the start of the hard disk |

pub mod account;
pub mod eeprom;
pub mod fatx;
pub mod hdd;
