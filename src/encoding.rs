//! Byte-level fixups applied to received frames.
//!
//! The transmitter clocks every data byte out least-significant bit first,
//! while everything downstream expects the most-significant bit first. The
//! packet engine also appends two status bytes whose raw encodings need
//! normalising before they are useful:
//!
//! - **RSSI** is two's complement; flipping the sign bit maps it onto an
//!   unsigned scale where larger means stronger.
//! - **LQI** carries a checksum-passed flag in its top bit. Checksumming is
//!   disabled, so the flag is cleared rather than exposed.
//!
//! ## Functions
//!
//! - [`reverse_bits`]: mirrors a byte (bit 0 <-> bit 7, ...)
//! - [`normalize_rssi`]: sign-bit inversion of a raw RSSI reading
//! - [`clear_crc_flag`]: strips the stale checksum flag from an LQI byte
//! - [`reverse_buffer`]: mirrors every byte of a slice in place

use crate::consts::{LQI_CRC_OK, RSSI_SIGN_BIT};

/// Mirrors the bit order of `b`.
///
/// Three masked swap-and-shift steps: nibbles, then pairs, then single bits.
pub const fn reverse_bits(b: u8) -> u8 {
    let b = ((b & 0b1111_0000) >> 4) | ((b & 0b0000_1111) << 4);
    let b = ((b & 0b1100_1100) >> 2) | ((b & 0b0011_0011) << 2);
    ((b & 0b1010_1010) >> 1) | ((b & 0b0101_0101) << 1)
}

/// Mirrors the bit order of every byte in `buf`.
pub fn reverse_buffer(buf: &mut [u8]) {
    for b in buf.iter_mut() {
        *b = reverse_bits(*b);
    }
}

/// Converts a raw two's complement RSSI reading to the unsigned offset scale.
pub const fn normalize_rssi(raw: u8) -> u8 {
    raw ^ RSSI_SIGN_BIT
}

/// Clears the checksum-passed flag of an LQI status byte.
pub const fn clear_crc_flag(lqi: u8) -> u8 {
    lqi & !LQI_CRC_OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_known_values() {
        assert_eq!(reverse_bits(0x01), 0x80);
        assert_eq!(reverse_bits(0x80), 0x01);
        assert_eq!(reverse_bits(0x12), 0x48);
        assert_eq!(reverse_bits(0xa0), 0x05);
        assert_eq!(reverse_bits(0xf0), 0x0f);
    }

    #[test]
    fn test_reverse_is_an_involution() {
        for b in 0..=u8::MAX {
            assert_eq!(reverse_bits(reverse_bits(b)), b);
        }
    }

    #[test]
    fn test_fixed_points_are_palindromes() {
        let mut fixed = 0;
        for b in 0..=u8::MAX {
            let palindrome = (0..4).all(|i| ((b >> i) & 1) == ((b >> (7 - i)) & 1));
            assert_eq!(reverse_bits(b) == b, palindrome, "byte {b:#04x}");
            if palindrome {
                fixed += 1;
            }
        }
        // Four free bits decide an 8-bit palindrome.
        assert_eq!(fixed, 16);
    }

    #[test]
    fn test_reverse_buffer_in_place() {
        let mut buf = [0x01, 0x3c, 0xc0];
        reverse_buffer(&mut buf);
        assert_eq!(buf, [0x80, 0x3c, 0x03]);
    }

    #[test]
    fn test_normalize_rssi_flips_sign_bit() {
        assert_eq!(normalize_rssi(0x00), 0x80);
        assert_eq!(normalize_rssi(0xff), 0x7f);
        assert_eq!(normalize_rssi(0x80), 0x00);
        assert_eq!(normalize_rssi(normalize_rssi(0x5a)), 0x5a);
    }

    #[test]
    fn test_clear_crc_flag() {
        assert_eq!(clear_crc_flag(0xad), 0x2d);
        assert_eq!(clear_crc_flag(0x2d), 0x2d);
    }
}
