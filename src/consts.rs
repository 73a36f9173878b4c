//! Constants used across the receive path.
//!
//! This module defines frame geometry, synthesizer reference values, band
//! limits, polling bounds, and the two register profiles the radio is brought
//! up with.
//!
//! ## Key Concepts
//!
//! - **Frame**: 8 data bytes from the air, 2 status bytes appended by the
//!   packet engine (RSSI, LQI) and 1 byte appended in software (frequency
//!   offset estimate).
//! - **Synthesizer words**: the carrier is programmed in units of
//!   `FREQ_REF_HZ / 2^16` Hz.
//! - **Bounded waits**: every hardware state change is polled a fixed number of
//!   times before the caller is told it timed out.
//!
//! These values should be used wherever framing or tuning logic is implemented
//! so buffer indices and timing stay consistent.

use crate::radio::Register;

/// Number of data bytes carried by one over-the-air frame.
pub const DATA_BYTES: usize = 8;

/// Status bytes appended by the packet engine (RSSI then LQI).
pub const HW_STATUS_BYTES: usize = 2;

/// Status bytes appended in software (frequency offset estimate).
pub const SW_STATUS_BYTES: usize = 1;

/// Total length of an assembled frame.
pub const FRAME_LEN: usize = DATA_BYTES + HW_STATUS_BYTES + SW_STATUS_BYTES;

/// Index of the RSSI status byte.
pub const RSSI_INDEX: usize = DATA_BYTES;

/// Index of the LQI status byte.
pub const LQI_INDEX: usize = DATA_BYTES + 1;

/// Index of the software appended frequency offset byte.
pub const FREQ_EST_INDEX: usize = FRAME_LEN - 1;

/// Sign bit of the raw RSSI register (two's complement).
pub const RSSI_SIGN_BIT: u8 = 0x80;

/// Checksum-passed flag in the LQI status byte.
///
/// Hardware checksum validation is disabled in [`RX_PROFILE`], so this bit is
/// stale and is cleared before a frame is handed out.
pub const LQI_CRC_OK: u8 = 0x80;

/// Number of leading data bytes covered by the diagnostic checksum.
pub const CRC_SPAN: usize = 6;

/// Crystal reference frequency in Hz.
///
/// Most boards ship a 26 MHz crystal; the ones this was built on carry 27 MHz.
pub const FREQ_REF_HZ: u32 = 27_000_000;

/// Power-on frequency in Hz.
pub const DEFAULT_FREQ_HZ: u32 = 902_382_395;

/// Lower edge of the 900 MHz band in Hz.
pub const BAND_900_MIN_HZ: u32 = 848_000_000;

/// Upper edge of the 900 MHz band in Hz.
pub const BAND_900_MAX_HZ: u32 = 962_000_000;

/// 1 kHz tuning step.
pub const STEP_1KHZ: u32 = 1_000;
/// 10 kHz tuning step.
pub const STEP_10KHZ: u32 = 10_000;
/// 100 kHz tuning step.
pub const STEP_100KHZ: u32 = 100_000;
/// 1 MHz tuning step.
pub const STEP_1MHZ: u32 = 1_000_000;

/// Maximum number of 1 ms ticks a main-context state wait will poll.
pub const STATE_POLL_TICKS: u16 = 255;

/// Maximum number of register polls an interrupt-context state wait will spin.
pub const ISR_STATE_POLLS: u16 = 255;

/// Settling time after a calibration strobe, in milliseconds.
pub const CAL_SETTLE_MS: u32 = 2;

/// Busy-loop iterations to hold RX on a channel before sampling RSSI.
///
/// Not calibrated against the crystal.
pub const SWEEP_DWELL_SPINS: u16 = 350;

/// Poll interval of the blocking loop while paused, in milliseconds.
pub const PAUSE_POLL_MS: u32 = 200;

/// Number of channels in the default calibration table.
pub const NUM_CHANNELS: usize = 1;

/// Sync word the receiver matches on.
///
/// The transmitter sends it LSB first, hence the unusual ordering.
pub const SYNC_WORD: u16 = 0xcb89;

/// `RFST` strobe: calibrate synthesizer and turn it off.
pub const RFST_SCAL: u8 = 0x01;
/// `RFST` strobe: enable RX, calibrating first when coming from IDLE.
pub const RFST_SRX: u8 = 0x02;
/// `RFST` strobe: enter IDLE.
pub const RFST_SIDLE: u8 = 0x04;

/// `RFIF` start-of-frame-delimiter flag.
pub const RFIF_IRQ_SFD: u8 = 0x01;
/// `RFIF` RX FIFO overflow flag.
pub const RFIF_IRQ_RXOVF: u8 = 0x40;

/// Register profile for the fixed-length frame receiver.
///
/// GFSK, 15/16 sync bits, 8-byte packets, RSSI and LQI appended, hardware CRC
/// check off, autocalibration on IDLE to RX.
pub const RX_PROFILE: [(Register, u8); 21] = [
    (Register::Sync1, (SYNC_WORD >> 8) as u8),
    (Register::Sync0, SYNC_WORD as u8),
    (Register::PktLen, DATA_BYTES as u8),
    (Register::PktCtrl1, 0xc4),
    (Register::PktCtrl0, 0x00),
    (Register::FsCtrl1, 0x06),
    (Register::MdmCfg4, 0xc9),
    (Register::MdmCfg3, 0x75),
    (Register::MdmCfg2, 0x11),
    (Register::MdmCfg0, 0xe5),
    (Register::Deviatn, 0x13),
    (Register::Mcsm0, 0x18),
    (Register::FocCfg, 0x17),
    (Register::FsCal3, 0xe9),
    (Register::FsCal2, 0x2a),
    (Register::FsCal1, 0x00),
    (Register::FsCal0, 0x1f),
    (Register::Test2, 0x81),
    (Register::Test1, 0x35),
    (Register::Test0, 0x09),
    (Register::PaTable0, 0x8e),
];

/// Register profile for RSSI sweeps.
///
/// 457 kHz IF, top DVGA gain steps disabled, 168.75 kHz filter, no
/// autocalibration (channels are calibrated explicitly).
pub const SCAN_PROFILE: [(Register, u8); 17] = [
    (Register::FsCtrl1, 0x12),
    (Register::FsCtrl0, 0x00),
    (Register::AgcCtrl2, 0xc3),
    (Register::FsCal3, 0xea),
    (Register::FsCal2, 0x2a),
    (Register::FsCal1, 0x00),
    (Register::FsCal0, 0x1f),
    (Register::Test2, 0x88),
    (Register::Test1, 0x31),
    (Register::Test0, 0x09),
    (Register::Mcsm0, 0x00),
    (Register::MdmCfg4, 0x99),
    (Register::MdmCfg3, 0x75),
    (Register::MdmCfg2, 0x14),
    (Register::MdmCfg1, 0x13),
    (Register::MdmCfg0, 0xff),
    (Register::Deviatn, 0x14),
];
