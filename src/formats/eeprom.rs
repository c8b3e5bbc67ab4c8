//! EEPROM - the 256-byte console configuration image.
//!
//! Holds the console's per-unit secrets, factory data and user settings.
//! Field names follow the 1.0.5993.1 kernel's labels.
//!
//! ## Layout
//! ```text
//! [0x00] EncryptedSection   (0x30 bytes)  HMAC-SHA1 tag + RC4 payload
//! [0x30] FactorySection     (0x30 bytes)  checksummed
//! [0x60] UserSection        (0x60 bytes)  checksummed
//! [0xC0] HardwareSection    (0x36 bytes)  1.6/1.6b only, no checksum
//! [0xF6] ThermalSensorCalibration (u16 LE)
//! [0xF8] Unused             (2 bytes)
//! [0xFA] UemInfo            (4 bytes)
//! [0xFE] Reserved           (2 bytes)
//! ```
//!
//! ## Factory Section (0x30 bytes)
//! ```text
//! [0x00] Checksum      (u32 LE, NOT of XConfigChecksum over 0x04..0x30)
//! [0x04] SerialNumber  (12 ASCII bytes)
//! [0x10] MACAddress    (6 bytes)
//! [0x16] Reserved      (2 bytes)
//! [0x18] OnlineKey     (0x10 bytes)
//! [0x28] VideoRegion   (u32 LE)
//! [0x2C] Reserved      (4 bytes)
//! ```
//!
//! ## User Section (0x60 bytes)
//! ```text
//! [0x00] Checksum                   (u32 LE, NOT of XConfigChecksum over 0x04..0x60)
//! [0x04] TimeZoneBias               (i32 LE, minutes)
//! [0x08] TimeZoneStdName            (4 bytes)
//! [0x0C] TimeZoneDltName            (4 bytes)
//! [0x10] Reserved                   (8 bytes)
//! [0x18] TimeZoneStdDate            (4 bytes: month, day, day of week, hour)
//! [0x1C] TimeZoneDltDate            (4 bytes)
//! [0x20] Reserved                   (8 bytes)
//! [0x28] TimeZoneStdBias            (i32 LE)
//! [0x2C] TimeZoneDltBias            (i32 LE)
//! [0x30] Language                   (u32 LE)
//! [0x34] VideoFlags                 (u32 LE)
//! [0x38] AudioFlags                 (u32 LE)
//! [0x3C] ParentalControlGames       (u32 LE)
//! [0x40] ParentalControlPassword    (u32 LE, packed passcode)
//! [0x44] ParentalControlMovies      (u32 LE)
//! [0x48] OnlineIpAddress            (4 bytes)
//! [0x4C] OnlineDnsAddress           (4 bytes)
//! [0x50] OnlineDefaultGatewayAddress(4 bytes)
//! [0x54] OnlineSubnetMask           (4 bytes)
//! [0x58] MiscFlags                  (u32 LE)
//! [0x5C] DvdRegion                  (u32 LE)
//! ```
//!
//! ## Notes
//! * Which root key encrypted the first section is not recorded anywhere;
//!   [`Eeprom::parse`] finds it by trial decryption and keeps it in
//!   [`Eeprom::key_generation`] so the image can be re-encrypted the same way.
//! * The thermal calibration, UEM and reserved bytes at the end belong to no
//!   section and are not covered by any checksum.

use std::io::{Cursor, Read, Write};

use log::warn;

use crate::checksum::xconfig_checksum;
use crate::crypto::eeprom::{SECTION_SIZE, TAG_SIZE, decrypt_section, encrypt_section};
use crate::keys::KeyGeneration;
use crate::utils::{
    bytesa, into_array, le_i32, le_u16, le_u32, null_padded_string, put_le_i32, put_le_u16,
    put_le_u32, put_u8, u8,
};
use crate::{Error, Result};

pub mod flags;

use flags::{Language, VideoRegion};

/// Size of a complete EEPROM image.
pub const EEPROM_SIZE: usize = 0x100;
/// Size of the factory section.
pub const FACTORY_SECTION_SIZE: usize = 0x30;
/// Size of the user section.
pub const USER_SECTION_SIZE: usize = 0x60;
/// Size of the hardware section.
pub const HARDWARE_SECTION_SIZE: usize = 0x36;

const FACTORY_OFFSET: usize = SECTION_SIZE;
const USER_OFFSET: usize = FACTORY_OFFSET + FACTORY_SECTION_SIZE;

/// The encrypted section, in plaintext form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSection {
    /// HMAC-SHA1 tag as stored. Recomputed whenever the section is
    /// encrypted.
    pub checksum: [u8; TAG_SIZE],
    /// Opaque value mixed into the encrypted payload.
    pub confounder: [u8; 8],
    /// Per-console hard disk key.
    pub hdd_key: [u8; 16],
    /// Game region bitmask, see [`flags::game_region`].
    pub game_region: u32,
}

impl EncryptedSection {
    /// Parse a plaintext section from `r`.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            checksum: bytesa(r)?,
            confounder: bytesa(r)?,
            hdd_key: bytesa(r)?,
            game_region: le_u32(r)?,
        })
    }

    /// Decrypt a raw section and parse it.
    ///
    /// Returns [`Error::VerificationFailed`] if no key generation verifies.
    pub fn decrypt(raw: &[u8; SECTION_SIZE]) -> Result<(Self, KeyGeneration)> {
        let mut plain = *raw;
        let generation = decrypt_section(&mut plain)?;
        Ok((Self::parse(&mut &plain[..])?, generation))
    }

    /// Serialise in plaintext form.
    pub fn to_bytes(&self) -> [u8; SECTION_SIZE] {
        let mut out = Vec::with_capacity(SECTION_SIZE);
        out.extend_from_slice(&self.checksum);
        out.extend_from_slice(&self.confounder);
        out.extend_from_slice(&self.hdd_key);
        put_le_u32(&mut out, self.game_region);
        into_array(out)
    }

    /// Serialise and encrypt with `generation`.
    pub fn encrypt(&self, generation: KeyGeneration) -> [u8; SECTION_SIZE] {
        let mut raw = self.to_bytes();
        encrypt_section(&mut raw, generation);
        raw
    }
}

/// Data written at the factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorySection {
    /// Stored checksum (bitwise NOT of the rolling checksum).
    pub checksum: u32,
    /// Console serial number, ASCII digits.
    pub serial_number: [u8; 12],
    /// Ethernet MAC address.
    pub mac_address: [u8; 6],
    pub reserved1: [u8; 2],
    /// Xbox Live online key.
    pub online_key: [u8; 16],
    /// Video standard, see [`VideoRegion`].
    pub video_region: u32,
    pub reserved2: [u8; 4],
}

impl FactorySection {
    /// Parse the factory section from `r`.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            checksum: le_u32(r)?,
            serial_number: bytesa(r)?,
            mac_address: bytesa(r)?,
            reserved1: bytesa(r)?,
            online_key: bytesa(r)?,
            video_region: le_u32(r)?,
            reserved2: bytesa(r)?,
        })
    }

    /// Serialise the section, including the stored checksum as-is.
    pub fn to_bytes(&self) -> [u8; FACTORY_SECTION_SIZE] {
        let mut out = Vec::with_capacity(FACTORY_SECTION_SIZE);
        put_le_u32(&mut out, self.checksum);
        out.extend_from_slice(&self.serial_number);
        out.extend_from_slice(&self.mac_address);
        out.extend_from_slice(&self.reserved1);
        out.extend_from_slice(&self.online_key);
        put_le_u32(&mut out, self.video_region);
        out.extend_from_slice(&self.reserved2);
        into_array(out)
    }

    /// The checksum value this section's contents call for.
    pub fn expected_checksum(&self) -> u32 {
        !xconfig_checksum(&self.to_bytes()[4..])
    }

    /// Whether the stored checksum matches the contents.
    pub fn is_checksum_valid(&self) -> bool {
        self.checksum == self.expected_checksum()
    }

    /// Recompute and store the checksum.
    pub fn update_checksum(&mut self) {
        self.checksum = self.expected_checksum();
    }

    /// Serial number as text.
    pub fn serial_number_str(&self) -> String {
        null_padded_string(&self.serial_number)
    }

    /// Typed video region.
    pub fn video_region(&self) -> Result<VideoRegion> {
        VideoRegion::try_from(self.video_region)
    }
}

/// A daylight-saving transition date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeZoneDate {
    pub month: u8,
    pub day: u8,
    pub day_of_week: u8,
    pub hour: u8,
}

impl TimeZoneDate {
    fn parse<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            month: u8(r)?,
            day: u8(r)?,
            day_of_week: u8(r)?,
            hour: u8(r)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        put_u8(out, self.month);
        put_u8(out, self.day);
        put_u8(out, self.day_of_week);
        put_u8(out, self.hour);
    }
}

/// Settings changed from the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSection {
    /// Stored checksum (bitwise NOT of the rolling checksum).
    pub checksum: u32,
    pub time_zone_bias: i32,
    pub time_zone_std_name: [u8; 4],
    pub time_zone_dlt_name: [u8; 4],
    pub reserved1: [u8; 8],
    pub time_zone_std_date: TimeZoneDate,
    pub time_zone_dlt_date: TimeZoneDate,
    pub reserved2: [u8; 8],
    pub time_zone_std_bias: i32,
    pub time_zone_dlt_bias: i32,
    /// See [`Language`].
    pub language: u32,
    /// See [`flags::video_flags`].
    pub video_flags: u32,
    /// See [`flags::audio_flags`].
    pub audio_flags: u32,
    /// See [`flags::parental_games`].
    pub parental_control_games: u32,
    /// Packed [`Passcode`].
    pub parental_control_password: u32,
    /// See [`flags::parental_movies`].
    pub parental_control_movies: u32,
    pub online_ip_address: [u8; 4],
    pub online_dns_address: [u8; 4],
    pub online_default_gateway_address: [u8; 4],
    pub online_subnet_mask: [u8; 4],
    /// See [`flags::misc_flags`].
    pub misc_flags: u32,
    /// See [`flags::dvd_region`].
    pub dvd_region: u32,
}

impl UserSection {
    /// Parse the user section from `r`.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            checksum: le_u32(r)?,
            time_zone_bias: le_i32(r)?,
            time_zone_std_name: bytesa(r)?,
            time_zone_dlt_name: bytesa(r)?,
            reserved1: bytesa(r)?,
            time_zone_std_date: TimeZoneDate::parse(r)?,
            time_zone_dlt_date: TimeZoneDate::parse(r)?,
            reserved2: bytesa(r)?,
            time_zone_std_bias: le_i32(r)?,
            time_zone_dlt_bias: le_i32(r)?,
            language: le_u32(r)?,
            video_flags: le_u32(r)?,
            audio_flags: le_u32(r)?,
            parental_control_games: le_u32(r)?,
            parental_control_password: le_u32(r)?,
            parental_control_movies: le_u32(r)?,
            online_ip_address: bytesa(r)?,
            online_dns_address: bytesa(r)?,
            online_default_gateway_address: bytesa(r)?,
            online_subnet_mask: bytesa(r)?,
            misc_flags: le_u32(r)?,
            dvd_region: le_u32(r)?,
        })
    }

    /// Serialise the section, including the stored checksum as-is.
    pub fn to_bytes(&self) -> [u8; USER_SECTION_SIZE] {
        let mut out = Vec::with_capacity(USER_SECTION_SIZE);
        put_le_u32(&mut out, self.checksum);
        put_le_i32(&mut out, self.time_zone_bias);
        out.extend_from_slice(&self.time_zone_std_name);
        out.extend_from_slice(&self.time_zone_dlt_name);
        out.extend_from_slice(&self.reserved1);
        self.time_zone_std_date.write(&mut out);
        self.time_zone_dlt_date.write(&mut out);
        out.extend_from_slice(&self.reserved2);
        put_le_i32(&mut out, self.time_zone_std_bias);
        put_le_i32(&mut out, self.time_zone_dlt_bias);
        for v in [
            self.language,
            self.video_flags,
            self.audio_flags,
            self.parental_control_games,
            self.parental_control_password,
            self.parental_control_movies,
        ] {
            put_le_u32(&mut out, v);
        }
        out.extend_from_slice(&self.online_ip_address);
        out.extend_from_slice(&self.online_dns_address);
        out.extend_from_slice(&self.online_default_gateway_address);
        out.extend_from_slice(&self.online_subnet_mask);
        put_le_u32(&mut out, self.misc_flags);
        put_le_u32(&mut out, self.dvd_region);
        into_array(out)
    }

    /// The checksum value this section's contents call for.
    pub fn expected_checksum(&self) -> u32 {
        !xconfig_checksum(&self.to_bytes()[4..])
    }

    /// Whether the stored checksum matches the contents.
    pub fn is_checksum_valid(&self) -> bool {
        self.checksum == self.expected_checksum()
    }

    /// Recompute and store the checksum.
    pub fn update_checksum(&mut self) {
        self.checksum = self.expected_checksum();
    }

    /// Typed dashboard language.
    pub fn language(&self) -> Result<Language> {
        Language::try_from(self.language)
    }

    /// Parental control passcode, unpacked from `parental_control_password`.
    pub fn passcode(&self) -> Passcode {
        Passcode::unpack(self.parental_control_password)
    }

    /// Pack `passcode` into `parental_control_password`.
    pub fn set_passcode(&mut self, passcode: Passcode) {
        self.parental_control_password = passcode.pack();
    }
}

/// Memory timing data present on 1.6/1.6b boards (zeroed elsewhere).
///
/// Every 1.6 shares one set of values and every 1.6b another. There is no
/// checksum over this section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareSection {
    pub fbio_delay: u8,
    pub addr_drv: u8,
    pub ctrim2: u8,
    pub emrs: u8,
    pub ext_slow: [u8; 10],
    pub slow: [u8; 10],
    pub typical: [u8; 10],
    pub fast: [u8; 10],
    pub ext_fast: [u8; 10],
}

impl HardwareSection {
    /// Parse the hardware section from `r`.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            fbio_delay: u8(r)?,
            addr_drv: u8(r)?,
            ctrim2: u8(r)?,
            emrs: u8(r)?,
            ext_slow: bytesa(r)?,
            slow: bytesa(r)?,
            typical: bytesa(r)?,
            fast: bytesa(r)?,
            ext_fast: bytesa(r)?,
        })
    }

    /// Serialise the hardware section.
    pub fn to_bytes(&self) -> [u8; HARDWARE_SECTION_SIZE] {
        let mut out = Vec::with_capacity(HARDWARE_SECTION_SIZE);
        for b in [self.fbio_delay, self.addr_drv, self.ctrim2, self.emrs] {
            put_u8(&mut out, b);
        }
        for row in [
            &self.ext_slow,
            &self.slow,
            &self.typical,
            &self.fast,
            &self.ext_fast,
        ] {
            out.extend_from_slice(row);
        }
        into_array(out)
    }

    /// `true` on boards that do not use this section.
    pub fn is_zeroed(&self) -> bool {
        self.to_bytes().iter().all(|&b| b == 0)
    }
}

/// Last-error record kept for service centres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UemInfo {
    /// Last error code; bootloader errors are not stored.
    pub last_code: u8,
    pub reserved1: u8,
    pub history: u16,
}

impl UemInfo {
    /// Parse the UEM record from `r`.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            last_code: u8(r)?,
            reserved1: u8(r)?,
            history: le_u16(r)?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        put_u8(out, self.last_code);
        put_u8(out, self.reserved1);
        put_le_u16(out, self.history);
    }
}

/// Parsed EEPROM image (decrypted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eeprom {
    /// Generation whose root key verified the encrypted section.
    pub key_generation: KeyGeneration,
    pub encrypted: EncryptedSection,
    pub factory: FactorySection,
    pub user: UserSection,
    pub hardware: HardwareSection,
    pub thermal_sensor_calibration: u16,
    /// Labelled unused by the kernel, though it is written on some units.
    pub unused: [u8; 2],
    pub uem: UemInfo,
    pub reserved: [u8; 2],
}

impl Eeprom {
    /// Read and decrypt a 256-byte EEPROM image from `r`.
    ///
    /// Returns [`Error::UnexpectedEof`] if fewer than 256 bytes are
    /// available and [`Error::VerificationFailed`] if the encrypted section
    /// does not verify under any key generation. Factory and user checksum
    /// mismatches are logged but not fatal; check them with
    /// [`FactorySection::is_checksum_valid`] / [`UserSection::is_checksum_valid`].
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        let image = bytesa::<EEPROM_SIZE>(r)?;
        Self::from_image(&image)
    }

    /// Decrypt and parse an image held in memory.
    ///
    /// Returns [`Error::InvalidSize`] unless `data` is exactly 256 bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let image: &[u8; EEPROM_SIZE] = data
            .try_into()
            .map_err(|_| Error::InvalidSize(data.len()))?;
        Self::from_image(image)
    }

    fn from_image(image: &[u8; EEPROM_SIZE]) -> Result<Self> {
        let (plain, key_generation) = decrypt_image(image)?;
        let eeprom = Self::from_decrypted(&plain, key_generation)?;

        if !eeprom.factory.is_checksum_valid() {
            warn!(
                "factory section checksum mismatch: stored {:08X}, expected {:08X}",
                eeprom.factory.checksum,
                eeprom.factory.expected_checksum()
            );
        }
        if !eeprom.user.is_checksum_valid() {
            warn!(
                "user section checksum mismatch: stored {:08X}, expected {:08X}",
                eeprom.user.checksum,
                eeprom.user.expected_checksum()
            );
        }
        Ok(eeprom)
    }

    /// Parse an already-decrypted image.
    ///
    /// `key_generation` is recorded as-is and used by [`Eeprom::to_bytes`].
    pub fn from_decrypted(plain: &[u8; EEPROM_SIZE], key_generation: KeyGeneration) -> Result<Self> {
        let mut r = Cursor::new(&plain[..]);
        Ok(Self {
            key_generation,
            encrypted: EncryptedSection::parse(&mut r)?,
            factory: FactorySection::parse(&mut r)?,
            user: UserSection::parse(&mut r)?,
            hardware: HardwareSection::parse(&mut r)?,
            thermal_sensor_calibration: le_u16(&mut r)?,
            unused: bytesa(&mut r)?,
            uem: UemInfo::parse(&mut r)?,
            reserved: bytesa(&mut r)?,
        })
    }

    /// Serialise in decrypted form.
    pub fn to_decrypted_bytes(&self) -> [u8; EEPROM_SIZE] {
        let mut out = Vec::with_capacity(EEPROM_SIZE);
        out.extend_from_slice(&self.encrypted.to_bytes());
        out.extend_from_slice(&self.factory.to_bytes());
        out.extend_from_slice(&self.user.to_bytes());
        out.extend_from_slice(&self.hardware.to_bytes());
        put_le_u16(&mut out, self.thermal_sensor_calibration);
        out.extend_from_slice(&self.unused);
        self.uem.write(&mut out);
        out.extend_from_slice(&self.reserved);
        into_array(out)
    }

    /// Serialise and encrypt with `generation`.
    ///
    /// The encrypted section's tag is recomputed; factory and user checksums
    /// are written as stored (call [`Eeprom::update_checksums`] first after
    /// editing fields).
    pub fn to_encrypted_bytes(&self, generation: KeyGeneration) -> [u8; EEPROM_SIZE] {
        encrypt_image(&self.to_decrypted_bytes(), generation)
    }

    /// Serialise and encrypt with the generation the image was parsed with.
    pub fn to_bytes(&self) -> [u8; EEPROM_SIZE] {
        self.to_encrypted_bytes(self.key_generation)
    }

    /// Write the encrypted image to `w`.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Recompute the factory and user section checksums.
    pub fn update_checksums(&mut self) {
        self.factory.update_checksum();
        self.user.update_checksum();
    }
}

/// Decrypt the encrypted section of a full image, returning the decrypted
/// image and the key generation that verified.
///
/// Bytes outside the encrypted section are copied unchanged.
pub fn decrypt_image(image: &[u8; EEPROM_SIZE]) -> Result<([u8; EEPROM_SIZE], KeyGeneration)> {
    let mut section: [u8; SECTION_SIZE] = std::array::from_fn(|i| image[i]);
    let generation = decrypt_section(&mut section)?;

    let mut plain = *image;
    plain[..SECTION_SIZE].copy_from_slice(&section);
    Ok((plain, generation))
}

/// Encrypt the first section of a decrypted image with `generation`.
pub fn encrypt_image(plain: &[u8; EEPROM_SIZE], generation: KeyGeneration) -> [u8; EEPROM_SIZE] {
    let mut section: [u8; SECTION_SIZE] = std::array::from_fn(|i| plain[i]);
    encrypt_section(&mut section, generation);

    let mut image = *plain;
    image[..SECTION_SIZE].copy_from_slice(&section);
    image
}

/// Parental control passcode button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PasscodeButton {
    Up = 0x1,
    Down = 0x2,
    Left = 0x3,
    Right = 0x4,
    A = 0x5,
    B = 0x6,
    X = 0x7,
    Y = 0x8,
    LeftTrigger = 0xB,
    RightTrigger = 0xC,
}

impl TryFrom<u8> for PasscodeButton {
    type Error = Error;
    fn try_from(v: u8) -> Result<Self> {
        Ok(match v {
            0x1 => Self::Up,
            0x2 => Self::Down,
            0x3 => Self::Left,
            0x4 => Self::Right,
            0x5 => Self::A,
            0x6 => Self::B,
            0x7 => Self::X,
            0x8 => Self::Y,
            0xB => Self::LeftTrigger,
            0xC => Self::RightTrigger,
            _ => return Err(Error::Parse("unknown passcode button")),
        })
    }
}

/// Four-button parental control passcode.
///
/// Packed into the low 16 bits of `ParentalControlPassword`, first button
/// in the highest nibble. Each element holds a raw nibble value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Passcode(pub [u8; 4]);

impl Passcode {
    /// Build a passcode from four buttons, first button first.
    pub fn new(buttons: [PasscodeButton; 4]) -> Self {
        Self(buttons.map(|b| b as u8))
    }

    /// Pack into the stored 32-bit form.
    pub fn pack(self) -> u32 {
        self.0
            .iter()
            .fold(0u32, |acc, &b| (acc << 4) | (b as u32 & 0xF))
    }

    /// Unpack from the stored form. The upper 16 bits are ignored.
    pub fn unpack(value: u32) -> Self {
        Self(std::array::from_fn(|i| {
            ((value >> (12 - 4 * i)) & 0xF) as u8
        }))
    }

    /// Decode each nibble; values that are not buttons yield `None`.
    pub fn buttons(self) -> [Option<PasscodeButton>; 4] {
        self.0.map(|b| PasscodeButton::try_from(b).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_plain() -> [u8; EEPROM_SIZE] {
        let mut img = [0u8; EEPROM_SIZE];
        // encrypted section payload
        img[0x14..0x1C].copy_from_slice(&[0x4C, 0x70, 0x33, 0xCB, 0x5B, 0xB5, 0x97, 0xD2]);
        img[0x1C..0x2C].copy_from_slice(&[0x11; 16]);
        img[0x2C..0x30].copy_from_slice(&flags::game_region::PAL.to_le_bytes());
        // factory
        img[0x34..0x40].copy_from_slice(b"123456789012");
        img[0x40..0x46].copy_from_slice(&[0x00, 0x50, 0xF2, 0x01, 0x02, 0x03]);
        img[0x58..0x5C].copy_from_slice(&(VideoRegion::PalI as u32).to_le_bytes());
        // user
        img[0x64..0x68].copy_from_slice(&(-60i32).to_le_bytes());
        img[0x68..0x6C].copy_from_slice(b"GMT\0");
        img[0x90..0x94].copy_from_slice(&(Language::German as u32).to_le_bytes());
        img[0xA0..0xA4].copy_from_slice(&0x5678u32.to_le_bytes());
        // extended
        img[0xF6..0xF8].copy_from_slice(&0x0102u16.to_le_bytes());
        img[0xFA] = 0x07;
        img[0xFC..0xFE].copy_from_slice(&0x0300u16.to_le_bytes());
        img
    }

    #[test]
    fn decrypted_layout_round_trips() {
        let plain = sample_plain();
        let e = Eeprom::from_decrypted(&plain, KeyGeneration::Gen1).unwrap();

        assert_eq!(e.encrypted.game_region, flags::game_region::PAL);
        assert_eq!(e.encrypted.hdd_key, [0x11; 16]);
        assert_eq!(e.factory.serial_number_str(), "123456789012");
        assert_eq!(e.factory.mac_address, [0x00, 0x50, 0xF2, 0x01, 0x02, 0x03]);
        assert_eq!(e.factory.video_region().unwrap(), VideoRegion::PalI);
        assert_eq!(e.user.time_zone_bias, -60);
        assert_eq!(null_padded_string(&e.user.time_zone_std_name), "GMT");
        assert_eq!(e.user.language().unwrap(), Language::German);
        assert_eq!(e.thermal_sensor_calibration, 0x0102);
        assert_eq!(e.uem.last_code, 0x07);
        assert_eq!(e.uem.history, 0x0300);
        assert!(e.hardware.is_zeroed());

        assert_eq!(e.to_decrypted_bytes(), plain);
    }

    #[test]
    fn uem_info_reads_and_writes_four_bytes() {
        let raw = [0x07u8, 0xAA, 0x00, 0x03];
        let uem = UemInfo::parse(&mut &raw[..]).unwrap();
        assert_eq!(uem.last_code, 0x07);
        assert_eq!(uem.reserved1, 0xAA);
        assert_eq!(uem.history, 0x0300);

        let mut out = Vec::new();
        uem.write(&mut out);
        assert_eq!(out, raw);

        assert!(matches!(
            UemInfo::parse(&mut &raw[..3]),
            Err(Error::UnexpectedEof)
        ));
    }

    #[test]
    fn user_fields_land_at_documented_offsets() {
        let mut plain = sample_plain();
        plain[0xBC..0xC0].copy_from_slice(&flags::dvd_region::REGION_2.to_le_bytes());
        plain[0xB8..0xBC].copy_from_slice(&flags::misc_flags::AUTO_POWER_DOWN.to_le_bytes());
        let e = Eeprom::from_decrypted(&plain, KeyGeneration::Gen2).unwrap();
        assert_eq!(e.user.dvd_region, flags::dvd_region::REGION_2);
        assert_eq!(e.user.misc_flags, flags::misc_flags::AUTO_POWER_DOWN);
        assert_eq!(e.user.parental_control_password, 0x5678);
    }

    #[test]
    fn full_image_round_trip() {
        for generation in KeyGeneration::ALL {
            let plain = sample_plain();
            let image = encrypt_image(&plain, generation);
            assert_ne!(image[0x14..0x30], plain[0x14..0x30]);
            assert_eq!(image[SECTION_SIZE..], plain[SECTION_SIZE..]);

            let e = Eeprom::from_bytes(&image).unwrap();
            assert_eq!(e.key_generation, generation);
            assert_eq!(e.to_bytes(), image);
        }
    }

    #[test]
    fn parse_reads_exactly_one_image() {
        let image = encrypt_image(&sample_plain(), KeyGeneration::Gen2);
        let mut data = image.to_vec();
        data.extend_from_slice(b"trailing");

        let mut r = Cursor::new(data);
        let e = Eeprom::parse(&mut r).unwrap();
        assert_eq!(e.key_generation, KeyGeneration::Gen2);
        assert_eq!(r.position(), EEPROM_SIZE as u64);
    }

    #[test]
    fn short_input_is_rejected() {
        let image = encrypt_image(&sample_plain(), KeyGeneration::Gen1);
        assert!(matches!(
            Eeprom::parse(&mut &image[..0xFF]),
            Err(Error::UnexpectedEof)
        ));
        assert!(matches!(
            Eeprom::from_bytes(&image[..0x80]),
            Err(Error::InvalidSize(0x80))
        ));
    }

    #[test]
    fn unencrypted_image_fails() {
        assert!(matches!(
            Eeprom::from_bytes(&sample_plain()),
            Err(Error::VerificationFailed)
        ));
    }

    #[test]
    fn checksums_regenerate() {
        let mut e = Eeprom::from_decrypted(&sample_plain(), KeyGeneration::Gen3).unwrap();
        assert!(!e.factory.is_checksum_valid());
        assert!(!e.user.is_checksum_valid());

        e.update_checksums();
        assert!(e.factory.is_checksum_valid());
        assert!(e.user.is_checksum_valid());

        let body = &e.factory.to_bytes()[4..];
        assert_eq!(e.factory.checksum, !xconfig_checksum(body));

        e.user.video_flags |= flags::video_flags::WIDESCREEN;
        assert!(!e.user.is_checksum_valid());
    }

    #[test]
    fn edited_image_reencrypts_with_new_generation() {
        let image = encrypt_image(&sample_plain(), KeyGeneration::Gen1);
        let mut e = Eeprom::from_bytes(&image).unwrap();
        e.user.language = Language::Japanese as u32;
        e.update_checksums();

        let out = e.to_encrypted_bytes(KeyGeneration::Gen3);
        let back = Eeprom::from_bytes(&out).unwrap();
        assert_eq!(back.key_generation, KeyGeneration::Gen3);
        assert_eq!(back.user.language().unwrap(), Language::Japanese);
        assert!(back.user.is_checksum_valid());
    }

    #[test]
    fn encrypted_section_helpers() {
        let plain = sample_plain();
        let section = EncryptedSection::parse(&mut &plain[..SECTION_SIZE]).unwrap();
        let raw = section.encrypt(KeyGeneration::Gen2);

        let (back, generation) = EncryptedSection::decrypt(&raw).unwrap();
        assert_eq!(generation, KeyGeneration::Gen2);
        assert_eq!(back.hdd_key, section.hdd_key);
        assert_eq!(back.confounder, section.confounder);
        assert_eq!(back.game_region, section.game_region);
    }

    #[test]
    fn passcode_packing() {
        let code = Passcode::new([
            PasscodeButton::Up,
            PasscodeButton::A,
            PasscodeButton::LeftTrigger,
            PasscodeButton::Y,
        ]);
        assert_eq!(code.pack(), 0x15B8);
        assert_eq!(Passcode::unpack(0x15B8), code);
        assert_eq!(Passcode::unpack(0xFFFF_15B8), code);
        assert_eq!(
            code.buttons(),
            [
                Some(PasscodeButton::Up),
                Some(PasscodeButton::A),
                Some(PasscodeButton::LeftTrigger),
                Some(PasscodeButton::Y),
            ]
        );
    }

    #[test]
    fn passcode_unknown_nibbles() {
        let code = Passcode::unpack(0x0910);
        assert_eq!(code.0, [0, 9, 1, 0]);
        assert_eq!(code.buttons(), [None, None, Some(PasscodeButton::Up), None]);
    }

    #[test]
    fn user_passcode_accessors() {
        let mut e = Eeprom::from_decrypted(&sample_plain(), KeyGeneration::Gen1).unwrap();
        assert_eq!(e.user.passcode(), Passcode([5, 6, 7, 8]));

        e.user.set_passcode(Passcode::new([PasscodeButton::Down; 4]));
        assert_eq!(e.user.parental_control_password, 0x2222);
    }
}
