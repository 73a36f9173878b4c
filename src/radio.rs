//! The radio control surface.
//!
//! [`RadioControl`] is the narrow interface the rest of the crate drives the
//! transceiver through: command strobes, register access, the receive FIFO,
//! and an interrupt-flag clear. Everything above it (synthesizer control,
//! channel calibration, frame assembly) is hardware-agnostic and runs the same
//! against a register-mapped CC1110, an SPI-attached CC1101 or
//! [`SimRadio`](crate::sim::SimRadio).
//!
//! Register access is infallible at this layer. Bus-attached adapters are
//! expected to log and swallow transfer errors, the same way pin errors are
//! ignored by `embedded-hal` pin drivers in tight timing loops.

use crate::consts::{RFST_SCAL, RFST_SIDLE, RFST_SRX};

/// Radio registers used by this crate, with their CC1110 XDATA addresses.
#[allow(missing_docs)]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
#[repr(u16)]
pub enum Register {
    Sync1 = 0xdf00,
    Sync0 = 0xdf01,
    PktLen = 0xdf02,
    PktCtrl1 = 0xdf03,
    PktCtrl0 = 0xdf04,
    FsCtrl1 = 0xdf07,
    FsCtrl0 = 0xdf08,
    Freq2 = 0xdf09,
    Freq1 = 0xdf0a,
    Freq0 = 0xdf0b,
    MdmCfg4 = 0xdf0c,
    MdmCfg3 = 0xdf0d,
    MdmCfg2 = 0xdf0e,
    MdmCfg1 = 0xdf0f,
    MdmCfg0 = 0xdf10,
    Deviatn = 0xdf11,
    Mcsm0 = 0xdf14,
    FocCfg = 0xdf15,
    AgcCtrl2 = 0xdf17,
    FsCal3 = 0xdf1c,
    FsCal2 = 0xdf1d,
    FsCal1 = 0xdf1e,
    FsCal0 = 0xdf1f,
    Test2 = 0xdf23,
    Test1 = 0xdf24,
    Test0 = 0xdf25,
    PaTable0 = 0xdf2e,
    /// Frequency offset estimate (read only).
    FreqEst = 0xdf38,
    /// Link quality indicator (read only).
    Lqi = 0xdf39,
    /// Received signal strength, two's complement (read only).
    Rssi = 0xdf3a,
    /// Main radio control state (read only).
    MarcState = 0xdf3b,
}

impl Register {
    /// XDATA address of the register.
    pub const fn address(self) -> u16 {
        self as u16
    }
}

/// Command strobes understood by the radio.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Strobe {
    /// Calibrate the synthesizer and turn it off.
    Calibrate,
    /// Enter receive mode. Autocalibrates first when leaving IDLE.
    Rx,
    /// Enter IDLE, turning the synthesizer off.
    Idle,
}

impl Strobe {
    /// Value to write to the `RFST` register.
    pub const fn code(self) -> u8 {
        match self {
            Strobe::Calibrate => RFST_SCAL,
            Strobe::Rx => RFST_SRX,
            Strobe::Idle => RFST_SIDLE,
        }
    }
}

/// Decoded main radio control state (`MARCSTATE`).
///
/// The hardware has two dozen sub-states; they are folded into the groups
/// this crate cares about.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum MarcState {
    /// Radio asleep.
    Sleep,
    /// Synthesizer off, ready for commands.
    Idle,
    /// Manual or automatic synthesizer calibration in progress.
    Calibrating,
    /// Regulator, VCO or synthesizer settling.
    Settling,
    /// Receiving (including end-of-packet and RX reset sub-states).
    Rx,
    /// The RX FIFO overflowed.
    RxOverflow,
    /// Any transmit-side state.
    Transmitting,
    /// A value this crate does not know about.
    Unknown(u8),
}

impl MarcState {
    /// Decodes a raw `MARCSTATE` value.
    pub const fn from_raw(raw: u8) -> Self {
        match raw & 0x1f {
            0x00 => MarcState::Sleep,
            0x01 => MarcState::Idle,
            0x05 | 0x08 | 0x0c => MarcState::Calibrating,
            0x03 | 0x04 | 0x06 | 0x07 | 0x09..=0x0b => MarcState::Settling,
            0x0d..=0x0f => MarcState::Rx,
            0x11 => MarcState::RxOverflow,
            0x10 | 0x12..=0x16 => MarcState::Transmitting,
            other => MarcState::Unknown(other),
        }
    }

    /// Canonical raw value for this state group.
    pub const fn raw(self) -> u8 {
        match self {
            MarcState::Sleep => 0x00,
            MarcState::Idle => 0x01,
            MarcState::Calibrating => 0x08,
            MarcState::Settling => 0x0a,
            MarcState::Rx => 0x0d,
            MarcState::RxOverflow => 0x11,
            MarcState::Transmitting => 0x13,
            MarcState::Unknown(raw) => raw,
        }
    }
}

/// The three synthesizer frequency bytes (`FREQ2`, `FREQ1`, `FREQ0`).
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct FreqWords {
    /// Bits 23..16 of the frequency word.
    pub freq2: u8,
    /// Bits 15..8 of the frequency word.
    pub freq1: u8,
    /// Bits 7..0 of the frequency word.
    pub freq0: u8,
}

impl FreqWords {
    /// Splits a 24-bit frequency word into register bytes.
    pub const fn from_word(word: u32) -> Self {
        Self {
            freq2: (word >> 16) as u8,
            freq1: (word >> 8) as u8,
            freq0: word as u8,
        }
    }

    /// Joins the register bytes back into a 24-bit word.
    pub const fn word(self) -> u32 {
        ((self.freq2 as u32) << 16) | ((self.freq1 as u32) << 8) | self.freq0 as u32
    }
}

/// Synthesizer calibration result bytes (`FSCAL3`, `FSCAL2`, `FSCAL1`).
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct CalWords {
    /// Charge pump current calibration.
    pub fscal3: u8,
    /// VCO band selection.
    pub fscal2: u8,
    /// VCO capacitor array calibration.
    pub fscal1: u8,
}

/// Operations the receive path needs from a transceiver.
///
/// Implement the five required methods for a platform; the rest are built on
/// top of them.
pub trait RadioControl {
    /// Issues a command strobe.
    fn strobe(&mut self, cmd: Strobe);

    /// Clears all pending RF interrupt flags.
    fn clear_interrupts(&mut self);

    /// Reads a configuration or status register.
    fn read_register(&mut self, reg: Register) -> u8;

    /// Writes a configuration register.
    fn write_register(&mut self, reg: Register, value: u8);

    /// Pops one byte from the receive FIFO.
    fn read_fifo(&mut self) -> u8;

    /// Current main radio control state.
    fn marc_state(&mut self) -> MarcState {
        MarcState::from_raw(self.read_register(Register::MarcState))
    }

    /// Raw two's complement RSSI reading.
    fn rssi(&mut self) -> u8 {
        self.read_register(Register::Rssi)
    }

    /// Frequency offset estimate. Only meaningful once the radio is idle.
    fn freq_offset(&mut self) -> u8 {
        self.read_register(Register::FreqEst)
    }

    /// Reads the programmed synthesizer frequency bytes.
    fn freq_words(&mut self) -> FreqWords {
        FreqWords {
            freq2: self.read_register(Register::Freq2),
            freq1: self.read_register(Register::Freq1),
            freq0: self.read_register(Register::Freq0),
        }
    }

    /// Programs the synthesizer frequency bytes.
    fn write_freq_words(&mut self, words: FreqWords) {
        self.write_register(Register::Freq2, words.freq2);
        self.write_register(Register::Freq1, words.freq1);
        self.write_register(Register::Freq0, words.freq0);
    }

    /// Reads the synthesizer calibration bytes.
    fn cal_words(&mut self) -> CalWords {
        CalWords {
            fscal3: self.read_register(Register::FsCal3),
            fscal2: self.read_register(Register::FsCal2),
            fscal1: self.read_register(Register::FsCal1),
        }
    }

    /// Restores previously captured calibration bytes.
    fn write_cal_words(&mut self, cal: CalWords) {
        self.write_register(Register::FsCal3, cal.fscal3);
        self.write_register(Register::FsCal2, cal.fscal2);
        self.write_register(Register::FsCal1, cal.fscal1);
    }

    /// Writes every `(register, value)` pair of a profile in order.
    fn apply_profile(&mut self, profile: &[(Register, u8)]) {
        for &(reg, value) in profile {
            self.write_register(reg, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freq_words_split_and_join() {
        let words = FreqWords::from_word(0x21_6bec);
        assert_eq!(
            words,
            FreqWords {
                freq2: 0x21,
                freq1: 0x6b,
                freq0: 0xec
            }
        );
        assert_eq!(words.word(), 0x21_6bec);
    }

    #[test]
    fn test_marc_state_decoding() {
        assert_eq!(MarcState::from_raw(0x01), MarcState::Idle);
        assert_eq!(MarcState::from_raw(0x0d), MarcState::Rx);
        assert_eq!(MarcState::from_raw(0x0e), MarcState::Rx);
        assert_eq!(MarcState::from_raw(0x08), MarcState::Calibrating);
        assert_eq!(MarcState::from_raw(0x11), MarcState::RxOverflow);
        assert_eq!(MarcState::from_raw(0x13), MarcState::Transmitting);
        assert_eq!(MarcState::from_raw(0x1f), MarcState::Unknown(0x1f));
    }

    #[test]
    fn test_marc_state_raw_decodes_to_itself() {
        for state in [
            MarcState::Sleep,
            MarcState::Idle,
            MarcState::Calibrating,
            MarcState::Settling,
            MarcState::Rx,
            MarcState::RxOverflow,
            MarcState::Transmitting,
        ] {
            assert_eq!(MarcState::from_raw(state.raw()), state);
        }
    }

    #[test]
    fn test_strobe_codes() {
        assert_eq!(Strobe::Calibrate.code(), 0x01);
        assert_eq!(Strobe::Rx.code(), 0x02);
        assert_eq!(Strobe::Idle.code(), 0x04);
    }

    #[test]
    fn test_register_addresses() {
        assert_eq!(Register::Sync1.address(), 0xdf00);
        assert_eq!(Register::Freq2.address(), 0xdf09);
        assert_eq!(Register::MarcState.address(), 0xdf3b);
    }
}
