//! CRC16-CCITT (polynomial `0x1021`, initial value `0`, MSB first).
//!
//! Only used to render a diagnostic value next to a received frame. The link
//! layer CRC check is switched off in the radio, so nothing here gates frame
//! acceptance.

/// CRC16-CCITT generator polynomial.
pub const CRC16_POLY: u16 = 0x1021;

/// Folds one byte into a running CRC16-CCITT value.
pub fn crc16_update(crc: u16, byte: u8) -> u16 {
    let mut crc = crc ^ (u16::from(byte) << 8);
    for _ in 0..8 {
        crc = if crc & 0x8000 != 0 {
            (crc << 1) ^ CRC16_POLY
        } else {
            crc << 1
        };
    }
    crc
}

/// Calculates the CRC16-CCITT checksum of `data`.
///
/// # Examples
///
/// ```
/// use wxradio::crc::crc16_ccitt;
///
/// assert_eq!(crc16_ccitt(b"123456789"), 0x31c3);
/// ```
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    data.iter().fold(0, |crc, &b| crc16_update(crc, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_vector() {
        assert_eq!(crc16_ccitt(b"123456789"), 0x31c3);
    }

    #[test]
    fn test_zero_frame_hashes_to_zero() {
        // With a zero seed every shift of an all-zero register stays zero.
        assert_eq!(crc16_ccitt(&[0u8; 8]), 0x0000);
    }

    #[test]
    fn test_all_ones_differs_from_zeros() {
        let ones = crc16_ccitt(&[0xffu8; 8]);
        assert_eq!(ones, 0xa6e1);
        assert_ne!(ones, crc16_ccitt(&[0u8; 8]));
    }

    #[test]
    fn test_deterministic_and_sensitive_to_single_byte() {
        let a = [0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0];
        let mut b = a;
        b[3] ^= 0x01;
        assert_eq!(crc16_ccitt(&a), crc16_ccitt(&a));
        assert_ne!(crc16_ccitt(&a), crc16_ccitt(&b));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(crc16_ccitt(&[]), 0);
    }
}
