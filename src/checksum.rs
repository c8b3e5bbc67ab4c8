//! XConfigChecksum - the kernel's rolling 32-bit checksum.
//!
//! Sums the buffer as little-endian `u32` words, counting every carry out of
//! bit 31, then adds the carry count back in with one final end-around
//! carry. Bytes past the last whole word are ignored.
//!
//! The EEPROM factory and user sections store the bitwise NOT of this value;
//! hard disk config sectors store it as-is. Complementing is left to the
//! caller.

/// Compute the checksum over every whole 32-bit word in `data`.
///
/// A trailing 1-3 bytes are not part of any word and do not contribute.
pub fn xconfig_checksum(data: &[u8]) -> u32 {
    let mut sum = 0u32;
    let mut carries = 0u32;

    for word in data.chunks_exact(4) {
        let w = u32::from_le_bytes([word[0], word[1], word[2], word[3]]);
        let next = sum.wrapping_add(w);
        if next < sum {
            carries = carries.wrapping_add(1);
        }
        sum = next;
    }

    let folded = sum.wrapping_add(carries);
    if folded < sum {
        folded.wrapping_add(1)
    } else {
        folded
    }
}

/// Compute the checksum over the first `count` bytes of `data`.
///
/// `count` is a byte count; only `count / 4` words are summed. It is clamped
/// to `data.len()`.
pub fn xconfig_checksum_len(data: &[u8], count: u32) -> u32 {
    let end = data.len().min(count as usize);
    xconfig_checksum(&data[..end])
}
