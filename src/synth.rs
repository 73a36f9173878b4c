//! Frequency synthesizer control.
//!
//! Converts a carrier frequency in Hz into the synthesizer's 24-bit fixed-point
//! word (`round(hz * 2^16 / reference_hz)`) and drives the radio through the
//! IDLE -> calibrate -> RX sequence needed to retune it.
//!
//! Each hardware state change is confirmed with a bounded poll. A poll that
//! runs out does not abort the retune; its outcome is reported in [`Tuned`] so
//! the caller can retry, give up, or carry on degraded.

use embedded_hal::delay::DelayNs;
use libm::round;

use crate::consts::{BAND_900_MAX_HZ, BAND_900_MIN_HZ, FREQ_REF_HZ, STATE_POLL_TICKS};
use crate::error::{RadioError, WaitResult};
use crate::radio::{FreqWords, MarcState, RadioControl, Strobe};
use crate::timer::wait_state;

/// Largest value the three frequency registers can hold.
pub const FREQ_WORD_MAX: u32 = 0x00ff_ffff;

/// An inclusive range of tunable carrier frequencies.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Band {
    /// Lowest tunable frequency in Hz.
    pub min_hz: u32,
    /// Highest tunable frequency in Hz.
    pub max_hz: u32,
}

impl Band {
    /// The 900 MHz band the high VCO covers.
    pub const BAND_900: Band = Band {
        min_hz: BAND_900_MIN_HZ,
        max_hz: BAND_900_MAX_HZ,
    };

    /// Whether `hz` is inside the band.
    pub const fn contains(&self, hz: u32) -> bool {
        hz >= self.min_hz && hz <= self.max_hz
    }

    /// Pulls `hz` to the nearest band edge if it lies outside.
    pub fn clamp(&self, hz: u32) -> u32 {
        hz.clamp(self.min_hz, self.max_hz)
    }
}

/// Result of a retune.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Tuned {
    /// The requested frequency, returned unchanged.
    ///
    /// The hardware does not report quantisation error back.
    pub hz: u32,
    /// Synthesizer bytes that were programmed.
    pub words: FreqWords,
    /// Outcome of waiting for IDLE before reprogramming.
    pub idle: WaitResult,
    /// Outcome of waiting for RX after the receive strobe.
    pub rx: WaitResult,
}

impl Tuned {
    /// Whether both state transitions were confirmed.
    pub fn confirmed(&self) -> bool {
        self.idle.is_ok() && self.rx.is_ok()
    }

    /// Turns the first unconfirmed transition into an error.
    pub fn check(self) -> Result<u32, RadioError> {
        let _ = self.idle?;
        let _ = self.rx?;
        Ok(self.hz)
    }
}

/// Synthesizer configuration: reference crystal and tunable band.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Synthesizer {
    reference_hz: u32,
    band: Band,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(FREQ_REF_HZ)
    }
}

impl Synthesizer {
    /// Creates a synthesizer for a `reference_hz` crystal covering the 900 MHz band.
    pub const fn new(reference_hz: u32) -> Self {
        Self {
            reference_hz,
            band: Band::BAND_900,
        }
    }

    /// Replaces the tunable band.
    pub const fn with_band(mut self, band: Band) -> Self {
        self.band = band;
        self
    }

    /// Crystal reference frequency in Hz.
    pub const fn reference_hz(&self) -> u32 {
        self.reference_hz
    }

    /// Tunable band.
    pub const fn band(&self) -> Band {
        self.band
    }

    /// Converts a carrier frequency to the 24-bit synthesizer word.
    ///
    /// # Returns
    /// - `Err(RadioError::OutOfBand)` if `hz` lies outside the band or the
    ///   word would not fit the registers
    pub fn word_for(&self, hz: u32) -> Result<u32, RadioError> {
        if !self.band.contains(hz) {
            return Err(RadioError::OutOfBand(hz));
        }
        let word = round(f64::from(hz) * 65536.0 / f64::from(self.reference_hz));
        if word > f64::from(FREQ_WORD_MAX) {
            return Err(RadioError::OutOfBand(hz));
        }
        Ok(word as u32)
    }

    /// Converts programmed synthesizer bytes back to a frequency in Hz.
    pub fn hz_for(&self, words: FreqWords) -> u32 {
        round(f64::from(words.word()) * f64::from(self.reference_hz) / 65536.0) as u32
    }

    /// Writes the synthesizer bytes for `hz` without any state changes.
    pub fn program<R: RadioControl>(&self, radio: &mut R, hz: u32) -> Result<FreqWords, RadioError> {
        let words = FreqWords::from_word(self.word_for(hz)?);
        radio.write_freq_words(words);
        Ok(words)
    }

    /// Retunes the receiver to `hz`.
    ///
    /// See [`tune_with`](Synthesizer::tune_with).
    pub fn tune<R, D>(&self, radio: &mut R, delay: &mut D, hz: u32) -> Result<Tuned, RadioError>
    where
        R: RadioControl,
        D: DelayNs,
    {
        self.tune_with(radio, delay, hz, || {})
    }

    /// Retunes the receiver to `hz`, running `on_armed` once RX has been strobed.
    ///
    /// Sequence:
    /// 1. strobe IDLE and wait (bounded) for it
    /// 2. clear pending interrupt flags so no stale event fires afterwards
    /// 3. program the three frequency bytes
    /// 4. strobe RX, which autocalibrates coming out of IDLE
    /// 5. run `on_armed` (receivers reset their flags here)
    /// 6. wait (bounded) for RX
    ///
    /// # Returns
    /// - `Err(RadioError::OutOfBand)` before touching the radio if `hz` cannot
    ///   be programmed
    /// - `Ok(Tuned)` otherwise, with the two wait outcomes inside
    pub fn tune_with<R, D, F>(
        &self,
        radio: &mut R,
        delay: &mut D,
        hz: u32,
        on_armed: F,
    ) -> Result<Tuned, RadioError>
    where
        R: RadioControl,
        D: DelayNs,
        F: FnOnce(),
    {
        let words = FreqWords::from_word(self.word_for(hz)?);

        radio.strobe(Strobe::Idle);
        let idle = wait_state(radio, delay, MarcState::Idle, STATE_POLL_TICKS);
        radio.clear_interrupts();

        radio.write_freq_words(words);
        radio.strobe(Strobe::Rx);
        on_armed();

        let rx = wait_state(radio, delay, MarcState::Rx, STATE_POLL_TICKS);
        debug!("tuned to {} Hz", hz);
        Ok(Tuned {
            hz,
            words,
            idle,
            rx,
        })
    }
}
