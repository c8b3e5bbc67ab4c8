//! Fixed sectors at the start of the console hard disk.
//!
//! ## Refurb info (one 0x200-byte sector)
//! ```text
//! [0x00] Signature        (u32 LE, "BRFR")
//! [0x04] PowerCycleCount  (u32 LE)
//! [0x08] FirstSetTime     (i64 LE, FILETIME)
//! [0x10] unused
//! ```
//!
//! ## Config sector (0x200 bytes, the kernel's `XBOX_CONFIG_SECTOR`)
//! ```text
//! [0x000] SectorBeginSignature (u32 LE)
//! [0x004] Version              (u32 LE)
//! [0x008] SectorCount          (u32 LE)
//! [0x00C] Data                 (0x1EC bytes)
//! [0x1F8] Checksum             (u32 LE, XConfigChecksum over 0x000..0x1F8, not complemented)
//! [0x1FC] SectorEndSignature   (u32 LE)
//! ```

use std::io::Read;

use crate::checksum::xconfig_checksum;
use crate::utils::{bytesa, into_array, le_u32, put_le_u32};
use crate::{Error, Result};

/// Hard disk sector size.
pub const SECTOR_SIZE: usize = 0x200;
/// "BRFR" read as a little-endian `u32`.
pub const REFURB_SIGNATURE: u32 = 0x5246_5242;
/// Payload size of a config sector.
pub const CONFIG_DATA_SIZE: usize = 0x1EC;

const CONFIG_CHECKSUM_OFFSET: usize = 0x1F8;

/// Refurbishment record: power cycles and first boot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefurbInfo {
    pub power_cycle_count: u32,
    /// Windows FILETIME (100 ns ticks since 1601).
    pub first_set_time: i64,
}

impl RefurbInfo {
    /// Read a whole refurb sector from `r`. Returns [`Error::Parse`] if the
    /// signature is missing.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        let sector = bytesa::<SECTOR_SIZE>(r)?;
        let mut r = &sector[..];
        if le_u32(&mut r)? != REFURB_SIGNATURE {
            return Err(Error::Parse("bad refurb signature"));
        }
        Ok(Self {
            power_cycle_count: le_u32(&mut r)?,
            first_set_time: i64::from_le_bytes(bytesa(&mut r)?),
        })
    }

    /// Serialise as a zero-padded sector.
    pub fn to_bytes(&self) -> [u8; SECTOR_SIZE] {
        let mut out = Vec::with_capacity(SECTOR_SIZE);
        put_le_u32(&mut out, REFURB_SIGNATURE);
        put_le_u32(&mut out, self.power_cycle_count);
        out.extend_from_slice(&self.first_set_time.to_le_bytes());
        out.resize(SECTOR_SIZE, 0);
        into_array(out)
    }
}

/// One config (cache database) sector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSector {
    pub begin_signature: u32,
    pub version: u32,
    pub sector_count: u32,
    pub data: Vec<u8>,
    pub checksum: u32,
    pub end_signature: u32,
}

impl ConfigSector {
    /// Parse a config sector from `r`. The checksum is not validated.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        let begin_signature = le_u32(r)?;
        let version = le_u32(r)?;
        let sector_count = le_u32(r)?;
        let mut data = vec![0u8; CONFIG_DATA_SIZE];
        r.read_exact(&mut data)?;
        Ok(Self {
            begin_signature,
            version,
            sector_count,
            data,
            checksum: le_u32(r)?,
            end_signature: le_u32(r)?,
        })
    }

    pub fn to_bytes(&self) -> [u8; SECTOR_SIZE] {
        let mut out = Vec::with_capacity(SECTOR_SIZE);
        put_le_u32(&mut out, self.begin_signature);
        put_le_u32(&mut out, self.version);
        put_le_u32(&mut out, self.sector_count);
        let mut data = self.data.clone();
        data.resize(CONFIG_DATA_SIZE, 0);
        out.extend_from_slice(&data);
        put_le_u32(&mut out, self.checksum);
        put_le_u32(&mut out, self.end_signature);
        into_array(out)
    }

    /// Checksum the contents should carry.
    pub fn expected_checksum(&self) -> u32 {
        xconfig_checksum(&self.to_bytes()[..CONFIG_CHECKSUM_OFFSET])
    }

    pub fn is_checksum_valid(&self) -> bool {
        self.checksum == self.expected_checksum()
    }

    pub fn update_checksum(&mut self) {
        self.checksum = self.expected_checksum();
    }
}
