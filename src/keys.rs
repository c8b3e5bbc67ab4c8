//! Root keys for the EEPROM encrypted section.
//!
//! The console kernel carries one 16-byte "EEPROM key" per hardware era.
//! Nothing in the image records which one was used, so decryption has to try
//! them in turn (see [`crate::crypto::eeprom`]).
//!
//! | Generation | Hardware revisions | Version |
//! |------------|--------------------|---------|
//! | [`KeyGeneration::Gen1`] | 1.0 | 1 |
//! | [`KeyGeneration::Gen2`] | 1.1 - 1.5 | 2 |
//! | [`KeyGeneration::Gen3`] | 1.6 / 1.6b | 3 |
//!
//! This module is a plain data container. The keys are compiled in and
//! cannot be replaced at runtime.

use std::fmt;

use crate::{Error, Result};

/// Length of an EEPROM root key in bytes.
pub const ROOT_KEY_SIZE: usize = 0x10;

const ROOT_KEY_1: [u8; ROOT_KEY_SIZE] = [
    0x2A, 0x3B, 0xAD, 0x2C, 0xB1, 0x94, 0x4F, 0x93, 0xAA, 0xCD, 0xCD, 0x7E, 0x0A, 0xC2, 0xEE, 0x5A,
];

const ROOT_KEY_2: [u8; ROOT_KEY_SIZE] = [
    0x1D, 0xF3, 0x5C, 0x83, 0x8E, 0xC9, 0xB6, 0xFC, 0xBD, 0xF6, 0x61, 0xAB, 0x4F, 0x06, 0x33, 0xE4,
];

const ROOT_KEY_3: [u8; ROOT_KEY_SIZE] = [
    0x2B, 0x84, 0x57, 0xBE, 0x9B, 0x1E, 0x65, 0xC6, 0xCD, 0x9D, 0x2B, 0xCE, 0xC1, 0xA2, 0x09, 0x61,
];

/// Hardware key generation that produced an encrypted section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyGeneration {
    /// Retail 1.0 consoles.
    Gen1 = 1,
    /// Retail 1.1 through 1.5 consoles.
    Gen2 = 2,
    /// Retail 1.6 and 1.6b consoles.
    Gen3 = 3,
}

impl KeyGeneration {
    /// Every generation, in the order decryption tries them.
    pub const ALL: [KeyGeneration; 3] = [Self::Gen1, Self::Gen2, Self::Gen3];

    /// The 16-byte root key bound to this generation.
    pub const fn root_key(self) -> &'static [u8; ROOT_KEY_SIZE] {
        match self {
            KeyGeneration::Gen1 => &ROOT_KEY_1,
            KeyGeneration::Gen2 => &ROOT_KEY_2,
            KeyGeneration::Gen3 => &ROOT_KEY_3,
        }
    }

    /// Numeric key version (1, 2 or 3).
    pub fn version(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for KeyGeneration {
    type Error = Error;
    fn try_from(v: u8) -> Result<Self> {
        match v {
            1 => Ok(Self::Gen1),
            2 => Ok(Self::Gen2),
            3 => Ok(Self::Gen3),
            _ => Err(Error::InvalidGeneration(v)),
        }
    }
}

impl fmt::Display for KeyGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let revisions = match self {
            KeyGeneration::Gen1 => "1.0",
            KeyGeneration::Gen2 => "1.1-1.5",
            KeyGeneration::Gen3 => "1.6/1.6b",
        };
        write!(f, "key version {} ({revisions})", self.version())
    }
}
