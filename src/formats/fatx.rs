//! FATX - the console's FAT variant used on hard disk partitions and memory
//! units.
//!
//! Only the on-disk structures and the kernel's naming and sizing rules are
//! covered here; cluster-chain walking is left to callers.
//!
//! ## Superblock (0x1000 bytes)
//! ```text
//! [0x000] Magic                   (u32 LE, "FATX")
//! [0x004] SerialNumber            (u32 LE)
//! [0x008] SectorsPerCluster       (u32 LE)
//! [0x00C] RootDirFirstCluster     (u32 LE)
//! [0x010] VolumeName              (32 UTF-16LE code units, null-terminated)
//! [0x050] OnlineData              (0x800 bytes, first 0x6C hold an account on memory units)
//! [0x850] Padding                 (0xFF up to 0x1000)
//! ```
//!
//! ## Directory entry (0x40 bytes)
//! ```text
//! [0x00] NameLength     (u8; 0x00/0xFF free, 0xE5 deleted)
//! [0x01] Attributes     (u8, see [`attributes`])
//! [0x02] Name           (42 bytes, unused tail filled with 0xFF)
//! [0x2C] FirstCluster   (u32 LE, masked to 16 bits on FATX16)
//! [0x30] FileSize       (u32 LE)
//! [0x34] CreationTime   (packed timestamp)
//! [0x38] LastWriteTime  (packed timestamp)
//! [0x3C] LastAccessTime (packed timestamp)
//! ```
//!
//! ## Timestamp (u32 LE, bit-packed)
//! ```text
//! bits  0-4   seconds / 2
//! bits  5-10  minute
//! bits 11-15  hour
//! bits 16-20  day   (1-31)
//! bits 21-24  month (1-12)
//! bits 25-31  year - 2000
//! ```

use std::io::{Cursor, Read, Write};

use crate::crypto::account::{ACCOUNT_SIZE, AccountKeys};
use crate::formats::account::OnlineAccount;
use crate::utils::{bytesa, into_array, le_u16, le_u32, put_le_u16, put_le_u32, put_u8, u8};
use crate::{Error, Result};

/// "FATX" read as a little-endian `u32`.
pub const MAGIC: u32 = 0x5854_4146;
/// Size of the superblock, padding included.
pub const SUPERBLOCK_SIZE: usize = 0x1000;
/// Size of the reserved online data area.
pub const ONLINE_DATA_SIZE: usize = 0x800;
/// Volume name length in UTF-16 code units.
pub const VOLUME_NAME_LEN: usize = 32;
/// Size of a directory entry.
pub const DIRENT_SIZE: usize = 0x40;
/// Longest file name.
pub const MAX_FILENAME: usize = 42;
/// Longest full path.
pub const MAX_FILEPATH: usize = 250;
/// Console memory page size.
pub const PAGE_SIZE: usize = 0x1000;
/// Volumes with fewer clusters than this use 16-bit FAT entries.
pub const FATX16_MAX_CLUSTERS: u32 = 0xFFF0;

const SUPERBLOCK_USED: usize = 0x50 + ONLINE_DATA_SIZE;

/// Directory entry `NameLength` markers.
pub mod markers {
    pub const FREE: u8 = 0x00;
    pub const FREE_ALT: u8 = 0xFF;
    pub const DELETED: u8 = 0xE5;
}

/// Directory entry attribute bits (trimmed Win32 set).
pub mod attributes {
    pub const READONLY: u8 = 0x01;
    pub const HIDDEN: u8 = 0x02;
    pub const SYSTEM: u8 = 0x04;
    pub const DIRECTORY: u8 = 0x10;
    pub const ARCHIVE: u8 = 0x20;
}

/// FATX16 table entry values. FATX32 uses the same values sign-extended to
/// 32 bits.
pub mod cluster16 {
    pub const FREE: u16 = 0x0000;
    pub const RESERVED: u16 = 0xFFF0;
    pub const BAD: u16 = 0xFFF7;
    /// Only seen in the first entry.
    pub const MEDIA: u16 = 0xFFF8;
    pub const LAST: u16 = 0xFFFF;
}

/// FAT entry width for a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatWidth {
    Fatx16,
    Fatx32,
}

impl FatWidth {
    /// Width the kernel picks for a volume of `cluster_count` clusters.
    pub fn for_cluster_count(cluster_count: u32) -> Self {
        if cluster_count < FATX16_MAX_CLUSTERS {
            FatWidth::Fatx16
        } else {
            FatWidth::Fatx32
        }
    }

    /// Bytes per FAT entry.
    pub fn entry_size(self) -> usize {
        match self {
            FatWidth::Fatx16 => 2,
            FatWidth::Fatx32 => 4,
        }
    }
}

/// Round `bytes` up to a whole number of memory pages.
pub fn round_to_pages(bytes: usize) -> usize {
    (bytes + (PAGE_SIZE - 1)) & !(PAGE_SIZE - 1)
}

/// Index of the lowest set bit, 32 for zero (the kernel's
/// `RtlFindFirstSetRightMember`). Used to turn cluster sizes into shifts.
pub fn find_first_set_right(value: u32) -> u8 {
    value.trailing_zeros() as u8
}

/// Whether the kernel accepts `name` as a FATX file name.
///
/// 1 to 42 characters from the allowed set, not starting with `.`.
pub fn is_valid_file_name(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_FILENAME || name.starts_with('.') {
        return false;
    }
    name.bytes().all(|b| {
        b.is_ascii_alphanumeric()
            || matches!(
                b,
                b' ' | b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'(' | b')' | b'-' | b'.'
                    | b'@' | b'[' | b']' | b'^' | b'_' | b'`' | b'{' | b'}' | b'~'
            )
    })
}

/// Calendar time as packed into directory entries (2-second resolution,
/// years 2000-2127).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    /// Always even.
    pub second: u8,
}

impl Timestamp {
    /// Unpack a stored timestamp. Fields are not range-checked.
    pub fn from_raw(raw: u32) -> Self {
        Self {
            second: ((raw & 0x1F) * 2) as u8,
            minute: ((raw >> 5) & 0x3F) as u8,
            hour: ((raw >> 11) & 0x1F) as u8,
            day: ((raw >> 16) & 0x1F) as u8,
            month: ((raw >> 21) & 0xF) as u8,
            year: 2000 + ((raw >> 25) & 0x7F) as u16,
        }
    }

    /// Pack for storage. Odd seconds round down; out-of-range fields are
    /// masked.
    pub fn to_raw(self) -> u32 {
        let year = u32::from(self.year.saturating_sub(2000)) & 0x7F;
        (u32::from(self.second / 2) & 0x1F)
            | (u32::from(self.minute) & 0x3F) << 5
            | (u32::from(self.hour) & 0x1F) << 11
            | (u32::from(self.day) & 0x1F) << 16
            | (u32::from(self.month) & 0xF) << 21
            | year << 25
    }
}

/// Volume superblock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    pub serial_number: u32,
    pub sectors_per_cluster: u32,
    pub root_dir_first_cluster: u32,
    pub volume_name: [u16; VOLUME_NAME_LEN],
    pub online_data: Vec<u8>,
}

impl Superblock {
    /// Parse a 0x1000-byte superblock from `r`.
    ///
    /// Returns [`Error::Parse`] if the magic is not "FATX". The padding is
    /// read and ignored.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        if le_u32(r)? != MAGIC {
            return Err(Error::Parse("bad FATX magic"));
        }
        let serial_number = le_u32(r)?;
        let sectors_per_cluster = le_u32(r)?;
        let root_dir_first_cluster = le_u32(r)?;

        let mut volume_name = [0u16; VOLUME_NAME_LEN];
        for unit in &mut volume_name {
            *unit = le_u16(r)?;
        }

        let mut online_data = vec![0u8; ONLINE_DATA_SIZE];
        r.read_exact(&mut online_data)?;
        let _padding = bytesa::<{ SUPERBLOCK_SIZE - SUPERBLOCK_USED }>(r)?;

        Ok(Self {
            serial_number,
            sectors_per_cluster,
            root_dir_first_cluster,
            volume_name,
            online_data,
        })
    }

    /// Serialise, padding with 0xFF to [`SUPERBLOCK_SIZE`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SUPERBLOCK_SIZE);
        put_le_u32(&mut out, MAGIC);
        put_le_u32(&mut out, self.serial_number);
        put_le_u32(&mut out, self.sectors_per_cluster);
        put_le_u32(&mut out, self.root_dir_first_cluster);
        for &unit in &self.volume_name {
            put_le_u16(&mut out, unit);
        }
        let mut online = self.online_data.clone();
        online.resize(ONLINE_DATA_SIZE, 0);
        out.extend_from_slice(&online);
        out.resize(SUPERBLOCK_SIZE, 0xFF);
        out
    }

    /// Write the padded superblock to `w`.
    pub fn write<W: Write>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.to_bytes())?;
        Ok(())
    }

    pub fn volume_name_str(&self) -> String {
        let end = self
            .volume_name
            .iter()
            .position(|&u| u == 0)
            .unwrap_or(VOLUME_NAME_LEN);
        String::from_utf16_lossy(&self.volume_name[..end])
    }

    /// Bytes per cluster for a given sector size.
    pub fn cluster_size(&self, sector_size: u32) -> u64 {
        u64::from(self.sectors_per_cluster) * u64::from(sector_size)
    }

    /// Verify and parse the account held at the start of the online data
    /// area (memory units).
    pub fn online_account(&self, keys: &AccountKeys) -> Result<OnlineAccount> {
        let raw = self
            .online_data
            .get(..ACCOUNT_SIZE)
            .ok_or(Error::InvalidSize(self.online_data.len()))?;
        OnlineAccount::from_bytes(raw, keys)
    }
}

/// Directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Name length, or one of the [`markers`].
    pub name_length: u8,
    pub attributes: u8,
    pub name: [u8; MAX_FILENAME],
    pub first_cluster: u32,
    pub file_size: u32,
    pub creation_time: u32,
    pub last_write_time: u32,
    pub last_access_time: u32,
}

impl DirectoryEntry {
    /// Build an in-use entry. Returns [`Error::Parse`] for a name the
    /// kernel would reject.
    pub fn new(name: &str, attributes: u8, first_cluster: u32, file_size: u32) -> Result<Self> {
        if !is_valid_file_name(name) {
            return Err(Error::Parse("invalid FATX file name"));
        }
        let mut raw_name = [0xFFu8; MAX_FILENAME];
        raw_name[..name.len()].copy_from_slice(name.as_bytes());
        Ok(Self {
            name_length: name.len() as u8,
            attributes,
            name: raw_name,
            first_cluster,
            file_size,
            creation_time: 0,
            last_write_time: 0,
            last_access_time: 0,
        })
    }

    /// Parse one 0x40-byte entry from `r`.
    pub fn parse<R: Read>(r: &mut R) -> Result<Self> {
        Ok(Self {
            name_length: u8(r)?,
            attributes: u8(r)?,
            name: bytesa(r)?,
            first_cluster: le_u32(r)?,
            file_size: le_u32(r)?,
            creation_time: le_u32(r)?,
            last_write_time: le_u32(r)?,
            last_access_time: le_u32(r)?,
        })
    }

    /// Parse every entry in a directory cluster, stopping at the first
    /// never-used slot.
    pub fn parse_cluster(data: &[u8]) -> Result<Vec<Self>> {
        let mut r = Cursor::new(data);
        let mut entries = Vec::new();
        for _ in 0..data.len() / DIRENT_SIZE {
            let entry = Self::parse(&mut r)?;
            if entry.is_free() {
                break;
            }
            entries.push(entry);
        }
        Ok(entries)
    }

    pub fn to_bytes(&self) -> [u8; DIRENT_SIZE] {
        let mut out = Vec::with_capacity(DIRENT_SIZE);
        put_u8(&mut out, self.name_length);
        put_u8(&mut out, self.attributes);
        out.extend_from_slice(&self.name);
        for v in [
            self.first_cluster,
            self.file_size,
            self.creation_time,
            self.last_write_time,
            self.last_access_time,
        ] {
            put_le_u32(&mut out, v);
        }
        into_array(out)
    }

    /// Never-used slot; ends the directory listing.
    pub fn is_free(&self) -> bool {
        matches!(self.name_length, markers::FREE | markers::FREE_ALT)
    }

    pub fn is_deleted(&self) -> bool {
        self.name_length == markers::DELETED
    }

    pub fn is_directory(&self) -> bool {
        self.attributes & attributes::DIRECTORY != 0
    }

    /// The entry's name, or `None` for free, deleted or corrupt slots.
    pub fn name_str(&self) -> Option<String> {
        let len = usize::from(self.name_length);
        if self.is_free() || self.is_deleted() || len > MAX_FILENAME {
            return None;
        }
        Some(String::from_utf8_lossy(&self.name[..len]).into_owned())
    }

    /// First cluster as the FAT sees it for `width`.
    pub fn first_cluster_for(&self, width: FatWidth) -> u32 {
        match width {
            FatWidth::Fatx16 => self.first_cluster & 0xFFFF,
            FatWidth::Fatx32 => self.first_cluster,
        }
    }

    pub fn last_write(&self) -> Timestamp {
        Timestamp::from_raw(self.last_write_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_rules() {
        assert!(is_valid_file_name("default.xbe"));
        assert!(is_valid_file_name("Save Game (1) ~{x}"));
        assert!(is_valid_file_name(&"a".repeat(MAX_FILENAME)));

        assert!(!is_valid_file_name(""));
        assert!(!is_valid_file_name(&"a".repeat(MAX_FILENAME + 1)));
        assert!(!is_valid_file_name(".hidden"));
        assert!(!is_valid_file_name(".."));
        for bad in ["a/b", "a\\b", "a:b", "a*b", "a?b", "a\"b", "a<b", "a|b", "a+b", "a,b", "a=b", "caf\u{e9}"] {
            assert!(!is_valid_file_name(bad), "{bad}");
        }
    }

    #[test]
    fn pages_round_up() {
        assert_eq!(round_to_pages(0), 0);
        assert_eq!(round_to_pages(1), 0x1000);
        assert_eq!(round_to_pages(0x1000), 0x1000);
        assert_eq!(round_to_pages(0x1001), 0x2000);
    }

    #[test]
    fn first_set_bit() {
        assert_eq!(find_first_set_right(1), 0);
        assert_eq!(find_first_set_right(0x4000), 14);
        assert_eq!(find_first_set_right(0x0001_0000), 16);
        assert_eq!(find_first_set_right(0x8000_0000), 31);
        assert_eq!(find_first_set_right(0x0600), 9);
        assert_eq!(find_first_set_right(0), 32);
    }

    #[test]
    fn fat_width_threshold() {
        assert_eq!(FatWidth::for_cluster_count(0xFFEF), FatWidth::Fatx16);
        assert_eq!(FatWidth::for_cluster_count(0xFFF0), FatWidth::Fatx32);
        assert_eq!(FatWidth::Fatx16.entry_size(), 2);
    }

    #[test]
    fn timestamp_packing() {
        let t = Timestamp {
            year: 2004,
            month: 11,
            day: 9,
            hour: 13,
            minute: 37,
            second: 42,
        };
        let raw = t.to_raw();
        assert_eq!(raw >> 25, 4);
        assert_eq!(raw & 0x1F, 21);
        assert_eq!(Timestamp::from_raw(raw), t);

        let odd = Timestamp { second: 43, ..t };
        assert_eq!(Timestamp::from_raw(odd.to_raw()).second, 42);
    }

    #[test]
    fn superblock_round_trip() {
        let mut volume_name = [0u16; VOLUME_NAME_LEN];
        for (unit, c) in volume_name.iter_mut().zip("Memory Unit".encode_utf16()) {
            *unit = c;
        }
        let sb = Superblock {
            serial_number: 0xDEAD_BEEF,
            sectors_per_cluster: 32,
            root_dir_first_cluster: 1,
            volume_name,
            online_data: vec![0u8; ONLINE_DATA_SIZE],
        };

        let raw = sb.to_bytes();
        assert_eq!(raw.len(), SUPERBLOCK_SIZE);
        assert_eq!(&raw[..4], b"FATX");
        assert!(raw[SUPERBLOCK_USED..].iter().all(|&b| b == 0xFF));

        let back = Superblock::parse(&mut &raw[..]).unwrap();
        assert_eq!(back, sb);
        assert_eq!(back.volume_name_str(), "Memory Unit");
        assert_eq!(back.cluster_size(0x200), 0x4000);
    }

    #[test]
    fn superblock_rejects_bad_magic() {
        let mut raw = vec![0u8; SUPERBLOCK_SIZE];
        raw[..4].copy_from_slice(b"FATY");
        assert!(matches!(
            Superblock::parse(&mut &raw[..]),
            Err(Error::Parse("bad FATX magic"))
        ));
    }

    #[test]
    fn memory_unit_account_is_read_from_online_data() {
        let mut account = OnlineAccount::from_decrypted(&[0u8; ACCOUNT_SIZE]).unwrap();
        account.set_gamertag("Player").unwrap();

        let mut online_data = vec![0u8; ONLINE_DATA_SIZE];
        online_data[..ACCOUNT_SIZE].copy_from_slice(&account.to_signed_bytes(&AccountKeys::Roaming));
        let sb = Superblock {
            serial_number: 1,
            sectors_per_cluster: 32,
            root_dir_first_cluster: 1,
            volume_name: [0; VOLUME_NAME_LEN],
            online_data,
        };

        let found = sb.online_account(&AccountKeys::Roaming).unwrap();
        assert_eq!(found.gamertag_str(), "Player");
    }

    #[test]
    fn directory_entries() {
        let mut file = DirectoryEntry::new("default.xbe", attributes::ARCHIVE, 0x1_0005, 1234).unwrap();
        file.last_write_time = 0x3169_6AB5;
        let dir = DirectoryEntry::new("saves", attributes::DIRECTORY, 7, 0).unwrap();
        let mut deleted = DirectoryEntry::new("old", 0, 9, 0).unwrap();
        deleted.name_length = markers::DELETED;

        let mut cluster = Vec::new();
        for e in [&file, &dir, &deleted] {
            cluster.extend_from_slice(&e.to_bytes());
        }
        cluster.resize(0x4000, 0xFF);

        let entries = DirectoryEntry::parse_cluster(&cluster).unwrap();
        assert_eq!(entries, [file, dir, deleted]);

        assert_eq!(entries[0].name_str().as_deref(), Some("default.xbe"));
        assert_eq!(entries[0].name[11], 0xFF);
        assert_eq!(entries[0].first_cluster_for(FatWidth::Fatx16), 5);
        assert_eq!(entries[0].first_cluster_for(FatWidth::Fatx32), 0x1_0005);
        assert_eq!(entries[0].last_write(), Timestamp::from_raw(0x3169_6AB5));
        assert!(entries[1].is_directory());
        assert!(entries[2].is_deleted());
        assert_eq!(entries[2].name_str(), None);

        assert!(DirectoryEntry::new("bad/name", 0, 0, 0).is_err());
    }
}
