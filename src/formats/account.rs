//! Online (Xbox LIVE) account record.
//!
//! Stored on memory units (roaming accounts) and at the start of the hard
//! disk (machine accounts). See [`crate::crypto::account`] for the byte
//! layout and signature scheme.
//!
//! A record on disk holds the first 0x10 confounder bytes encrypted.
//! [`OnlineAccount::parse`] verifies and decrypts, so the parsed value is
//! always plaintext; [`OnlineAccount::to_signed_bytes`] signs it again.

use std::io::{Cursor, Read, Write};

use crate::crypto::account::{ACCOUNT_SIZE, AccountKeys, decrypt_account, sign_account};
use crate::utils::{bytesa, into_array, le_u32, le_u64, null_padded_string, put_le_u32, put_le_u64};
use crate::{Error, Result};

/// Gamertag field width, including the terminator.
pub const GAMERTAG_SIZE: usize = 0x10;
/// Domain field width, including the terminator.
pub const DOMAIN_SIZE: usize = 0x14;
/// Realm field width, including the terminator.
pub const REALM_SIZE: usize = 0x18;

/// Account passcode button. Differs from the EEPROM parental control set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AccountPasscodeButton {
    /// D-pad or right stick up.
    Up = 1,
    Down = 2,
    Left = 3,
    Right = 4,
    X = 5,
    Y = 6,
    LeftTrigger = 9,
    RightTrigger = 10,
}

impl TryFrom<u8> for AccountPasscodeButton {
    type Error = Error;
    fn try_from(v: u8) -> Result<Self> {
        Ok(match v {
            1 => Self::Up,
            2 => Self::Down,
            3 => Self::Left,
            4 => Self::Right,
            5 => Self::X,
            6 => Self::Y,
            9 => Self::LeftTrigger,
            10 => Self::RightTrigger,
            _ => return Err(Error::Parse("unknown account passcode button")),
        })
    }
}

/// Parsed account record with a plaintext confounder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineAccount {
    pub xuid: u64,
    /// Must be zero on a stored account.
    pub xuid_flags: u32,
    pub gamertag: [u8; GAMERTAG_SIZE],
    /// Low four bits of the top byte are reserved.
    pub flags: u32,
    /// Raw button values, see [`AccountPasscodeButton`].
    pub passcode: [u8; 4],
    pub domain: [u8; DOMAIN_SIZE],
    pub realm: [u8; REALM_SIZE],
    pub confounder: [u8; 0x14],
    /// Truncated HMAC-SHA1, as stored. Recomputed on signing.
    pub verification: [u8; 8],
}

impl OnlineAccount {
    /// Read a signed 0x6C-byte record from `r`, verify it and decrypt the
    /// confounder.
    ///
    /// Returns [`Error::VerificationFailed`] if `keys` do not verify the
    /// record and [`Error::InvalidAccount`] if a field breaks the online
    /// rules.
    pub fn parse<R: Read>(r: &mut R, keys: &AccountKeys) -> Result<Self> {
        let mut raw = bytesa::<ACCOUNT_SIZE>(r)?;
        decrypt_account(&mut raw, keys)?;
        Self::from_decrypted(&raw)
    }

    /// Verify and parse a signed record held in memory.
    ///
    /// Returns [`Error::InvalidSize`] unless `data` is exactly 0x6C bytes.
    pub fn from_bytes(data: &[u8], keys: &AccountKeys) -> Result<Self> {
        if data.len() != ACCOUNT_SIZE {
            return Err(Error::InvalidSize(data.len()));
        }
        Self::parse(&mut &data[..], keys)
    }

    /// Parse a record whose confounder is already plaintext. No checks.
    pub fn from_decrypted(raw: &[u8; ACCOUNT_SIZE]) -> Result<Self> {
        let mut r = Cursor::new(&raw[..]);
        Ok(Self {
            xuid: le_u64(&mut r)?,
            xuid_flags: le_u32(&mut r)?,
            gamertag: bytesa(&mut r)?,
            flags: le_u32(&mut r)?,
            passcode: bytesa(&mut r)?,
            domain: bytesa(&mut r)?,
            realm: bytesa(&mut r)?,
            confounder: bytesa(&mut r)?,
            verification: bytesa(&mut r)?,
        })
    }

    /// Serialise with the confounder in plaintext.
    pub fn to_decrypted_bytes(&self) -> [u8; ACCOUNT_SIZE] {
        let mut out = Vec::with_capacity(ACCOUNT_SIZE);
        put_le_u64(&mut out, self.xuid);
        put_le_u32(&mut out, self.xuid_flags);
        out.extend_from_slice(&self.gamertag);
        put_le_u32(&mut out, self.flags);
        out.extend_from_slice(&self.passcode);
        out.extend_from_slice(&self.domain);
        out.extend_from_slice(&self.realm);
        out.extend_from_slice(&self.confounder);
        out.extend_from_slice(&self.verification);
        into_array(out)
    }

    /// Serialise and sign with `keys`.
    pub fn to_signed_bytes(&self, keys: &AccountKeys) -> [u8; ACCOUNT_SIZE] {
        let mut raw = self.to_decrypted_bytes();
        sign_account(&mut raw, keys);
        raw
    }

    /// Sign with `keys` and write the record to `w`.
    pub fn write<W: Write>(&self, w: &mut W, keys: &AccountKeys) -> Result<()> {
        w.write_all(&self.to_signed_bytes(keys))?;
        Ok(())
    }

    /// Gamertag up to its terminator.
    pub fn gamertag_str(&self) -> String {
        null_padded_string(&self.gamertag)
    }

    pub fn domain_str(&self) -> String {
        null_padded_string(&self.domain)
    }

    pub fn realm_str(&self) -> String {
        null_padded_string(&self.realm)
    }

    /// Replace the gamertag. Must be ASCII and leave room for the
    /// terminator.
    pub fn set_gamertag(&mut self, gamertag: &str) -> Result<()> {
        self.gamertag = fixed_field(gamertag, "gamertag too long")?;
        Ok(())
    }

    /// Decode each passcode byte; values that are not buttons yield `None`.
    pub fn passcode_buttons(&self) -> [Option<AccountPasscodeButton>; 4] {
        self.passcode.map(|b| AccountPasscodeButton::try_from(b).ok())
    }

    /// Store four passcode buttons, first button first.
    pub fn set_passcode(&mut self, buttons: [AccountPasscodeButton; 4]) {
        self.passcode = buttons.map(|b| b as u8);
    }
}

fn fixed_field<const N: usize>(value: &str, too_long: &'static str) -> Result<[u8; N]> {
    if !value.is_ascii() || value.contains('\0') {
        return Err(Error::InvalidAccount("field is not plain ASCII"));
    }
    if value.len() >= N {
        return Err(Error::InvalidAccount(too_long));
    }
    let mut out = [0u8; N];
    out[..value.len()].copy_from_slice(value.as_bytes());
    Ok(out)
}
