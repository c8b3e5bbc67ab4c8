//! Named values stored in EEPROM fields.
//!
//! Values match the kernel's definitions as collected on xboxdevwiki. Most
//! fields are bitmasks and are exposed as plain constants; the two enumerated
//! fields callers usually display ([`Language`], [`VideoRegion`]) also get a
//! typed form.

use crate::{Error, Result};

/// `EncryptedSection::game_region` bits.
pub mod game_region {
    pub const NONE: u32 = 0x0000_0000;
    pub const NTSC_M: u32 = 0x0000_0001;
    pub const NTSC_J: u32 = 0x0000_0002;
    pub const PAL: u32 = 0x0000_0004;
    /// Only present in later kernels.
    pub const TEST: u32 = 0x4000_0000;
    pub const MANUFACTURING: u32 = 0x8000_0000;
}

/// `UserSection::video_flags` bits.
pub mod video_flags {
    /// Default when no other resolution bit is set.
    pub const MODE_480I: u32 = 0x0000_0000;
    pub const WIDESCREEN: u32 = 0x0001_0000;
    pub const MODE_720P: u32 = 0x0002_0000;
    pub const MODE_1080I: u32 = 0x0004_0000;
    pub const MODE_480P: u32 = 0x0008_0000;
    pub const LETTERBOX: u32 = 0x0010_0000;
    pub const REFRESH_60HZ: u32 = 0x0040_0000;
    pub const REFRESH_50HZ: u32 = 0x0080_0000;
}

/// `UserSection::audio_flags` bits.
pub mod audio_flags {
    /// Default when neither mono nor surround is set.
    pub const STEREO: u32 = 0x0000_0000;
    pub const MONO: u32 = 0x0000_0001;
    pub const SURROUND: u32 = 0x0000_0002;
    pub const ENABLE_AC3: u32 = 0x0001_0000;
    pub const ENABLE_DTS: u32 = 0x0002_0000;
}

/// `UserSection::misc_flags` bits.
pub mod misc_flags {
    pub const AUTO_POWER_DOWN: u32 = 0x0001;
    pub const DISABLE_DST: u32 = 0x0002;
}

/// `UserSection::parental_control_games` ratings.
pub mod parental_games {
    /// Rating pending; parental control disabled.
    pub const RP: u32 = 0;
    pub const AO: u32 = 1;
    pub const M: u32 = 2;
    pub const T: u32 = 3;
    pub const E: u32 = 4;
    pub const KA: u32 = 5;
    pub const EC: u32 = 6;
}

/// `UserSection::parental_control_movies` ratings.
pub mod parental_movies {
    pub const NONE: u32 = 0;
    pub const NC17: u32 = 1;
    pub const R: u32 = 2;
    pub const PG13: u32 = 4;
    pub const PG: u32 = 5;
    pub const G: u32 = 7;
}

/// `UserSection::dvd_region` values (0 is region free).
pub mod dvd_region {
    pub const REGION_FREE: u32 = 0;
    pub const REGION_1: u32 = 1;
    pub const REGION_2: u32 = 2;
    pub const REGION_3: u32 = 3;
    pub const REGION_4: u32 = 4;
    pub const REGION_5: u32 = 5;
    pub const REGION_6: u32 = 6;
}

/// Dashboard language (`UserSection::language`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Language {
    None = 0,
    English = 1,
    Japanese = 2,
    German = 3,
    French = 4,
    Spanish = 5,
    Italian = 6,
    Korean = 7,
    Chinese = 8,
    Portuguese = 9,
}

impl TryFrom<u32> for Language {
    type Error = Error;
    fn try_from(v: u32) -> Result<Self> {
        Ok(match v {
            0 => Self::None,
            1 => Self::English,
            2 => Self::Japanese,
            3 => Self::German,
            4 => Self::French,
            5 => Self::Spanish,
            6 => Self::Italian,
            7 => Self::Korean,
            8 => Self::Chinese,
            9 => Self::Portuguese,
            _ => return Err(Error::Parse("unknown language")),
        })
    }
}

/// Factory video standard (`FactorySection::video_region`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum VideoRegion {
    None = 0x0000_0000,
    NtscM = 0x0040_0100,
    NtscJ = 0x0040_0200,
    PalI = 0x0080_0300,
    PalM = 0x0040_0400,
}

impl TryFrom<u32> for VideoRegion {
    type Error = Error;
    fn try_from(v: u32) -> Result<Self> {
        Ok(match v {
            0x0000_0000 => Self::None,
            0x0040_0100 => Self::NtscM,
            0x0040_0200 => Self::NtscJ,
            0x0080_0300 => Self::PalI,
            0x0040_0400 => Self::PalM,
            _ => return Err(Error::Parse("unknown video region")),
        })
    }
}
