//! Receive driver for a sub-GHz packet transceiver.
//!
//! This module provides the [`RxDriver`] struct, which owns the radio, the
//! frequency synthesizer settings and the frame assembler. Everything that can
//! change the receive session (tuning, calibration, sweeping, servicing radio
//! interrupts) goes through it, so a retune can never interleave with an
//! interrupt that is halfway through a frame.
//!
//! ## Example
//!
//! ```rust
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! use wxradio::consts::{DEFAULT_FREQ_HZ, RX_PROFILE};
//! use wxradio::driver::RxDriver;
//! use wxradio::frame::{RfEvent, SessionState};
//! use wxradio::sim::SimRadio;
//! use wxradio::synth::Synthesizer;
//!
//! let mut delay = NoopDelay::new();
//! let mut driver = RxDriver::new(SimRadio::new(), Synthesizer::default());
//! driver.init(&mut delay, &RX_PROFILE).unwrap();
//!
//! let tuned = driver.tune(&mut delay, DEFAULT_FREQ_HZ).unwrap();
//! assert!(tuned.confirmed());
//! assert_eq!(driver.state(), SessionState::Listening);
//!
//! // Called from the RF interrupt handler:
//! assert_eq!(driver.handle(RfEvent::FrameStart), None);
//! ```
//!
//! ## Design Notes
//!
//! With the `rf-isr` feature the driver lives in a
//! `critical_section::Mutex`; see [`crate::timer`] for the glue.

use embedded_hal::delay::DelayNs;

use crate::channel::{ChannelEntry, ChannelTable};
use crate::consts::STATE_POLL_TICKS;
use crate::encoding::normalize_rssi;
use crate::error::{RadioError, WaitResult};
use crate::frame::{Frame, FrameAssembler, RfEvent, RxStats, SessionState};
use crate::radio::{MarcState, RadioControl, Register, Strobe};
use crate::synth::{Synthesizer, Tuned};
use crate::timer::wait_state;

/// Interrupt-driven receiver.
///
/// # Type Parameters
/// - `R`: the transceiver, behind the [`RadioControl`] surface
#[derive(Debug)]
pub struct RxDriver<R: RadioControl> {
    radio: R,
    synth: Synthesizer,
    assembler: FrameAssembler,
}

impl<R: RadioControl> RxDriver<R> {
    /// Wraps a radio. The session starts idle; call [`init`](RxDriver::init)
    /// and then [`tune`](RxDriver::tune) to start receiving.
    pub fn new(radio: R, synth: Synthesizer) -> Self {
        Self {
            radio,
            synth,
            assembler: FrameAssembler::new(),
        }
    }

    /// Brings the radio up with a register profile.
    ///
    /// Strobes IDLE, waits (bounded) for it, writes `profile` in order and
    /// clears any pending interrupt flags.
    ///
    /// # Returns
    /// The outcome of the IDLE wait. The profile is written either way.
    pub fn init<D: DelayNs>(&mut self, delay: &mut D, profile: &[(Register, u8)]) -> WaitResult {
        self.assembler.halt();
        self.radio.strobe(Strobe::Idle);
        let idle = wait_state(&mut self.radio, delay, MarcState::Idle, STATE_POLL_TICKS);
        self.radio.apply_profile(profile);
        self.radio.clear_interrupts();
        debug!("radio initialized with {} registers", profile.len());
        idle
    }

    /// Retunes to `hz` and re-arms for the next frame.
    ///
    /// A frame that was still being received is abandoned and counted in
    /// [`RxStats::aborted`]. The assembler is re-armed right after the receive
    /// strobe, before the RX wait, so no event is lost to the wait.
    ///
    /// # Returns
    /// - `Err(RadioError::OutOfBand)`: nothing was touched
    /// - `Ok(Tuned)`: with both wait outcomes; see [`Tuned::check`]
    pub fn tune<D: DelayNs>(&mut self, delay: &mut D, hz: u32) -> Result<Tuned, RadioError> {
        let _ = self.synth.word_for(hz)?;
        let Self {
            radio,
            synth,
            assembler,
        } = self;
        assembler.begin_calibration();
        synth.tune_with(radio, delay, hz, || assembler.rearm())
    }

    /// Services one radio event. Call from the RF interrupt handlers.
    ///
    /// # Returns
    /// The completed frame, exactly once per frame.
    pub fn handle(&mut self, event: RfEvent) -> Option<Frame> {
        self.assembler.handle(&mut self.radio, event)
    }

    /// Calibrates channel `ch` of `table` at `hz`, leaving the radio idle.
    pub fn calibrate<D, const N: usize>(
        &mut self,
        table: &mut ChannelTable<N>,
        delay: &mut D,
        hz: u32,
        ch: usize,
    ) -> Result<u32, RadioError>
    where
        D: DelayNs,
    {
        self.assembler.begin_calibration();
        let result = table.calibrate(&mut self.radio, &self.synth, delay, hz, ch);
        self.assembler.halt();
        result
    }

    /// Runs one RSSI sweep over `table`. Frame reception is halted.
    pub fn sweep<F, const N: usize>(&mut self, table: &mut ChannelTable<N>, dwell_spins: u16, on_sample: F)
    where
        F: FnMut(usize, &ChannelEntry),
    {
        self.assembler.halt();
        table.sweep(&mut self.radio, dwell_spins, on_sample);
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.assembler.state()
    }

    /// Whether an overflow or out-of-RX byte was flagged since the last re-arm.
    pub fn error(&self) -> bool {
        self.assembler.error()
    }

    /// Receive counters.
    pub fn stats(&self) -> RxStats {
        self.assembler.stats()
    }

    /// Live normalized signal strength.
    pub fn rssi_now(&mut self) -> u8 {
        normalize_rssi(self.radio.rssi())
    }

    /// Synthesizer settings.
    pub fn synth(&self) -> &Synthesizer {
        &self.synth
    }

    /// The radio.
    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// The radio, mutably. Changing its state behind the driver's back can
    /// confuse the session.
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Gives the radio back.
    pub fn release(self) -> R {
        self.radio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DATA_BYTES, DEFAULT_FREQ_HZ, RX_PROFILE, SCAN_PROFILE};
    use crate::radio::FreqWords;
    use crate::sim::SimRadio;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    const AIR: [u8; 10] = [0x80, 0x40, 0x20, 0x10, 0x08, 0x04, 0x02, 0x01, 0xc0, 0x95];

    fn listening() -> (RxDriver<SimRadio>, NoopDelay) {
        let mut delay = NoopDelay::new();
        let mut driver = RxDriver::new(SimRadio::new(), Synthesizer::default());
        let _ = driver.init(&mut delay, &RX_PROFILE).unwrap();
        let _ = driver.tune(&mut delay, DEFAULT_FREQ_HZ).unwrap();
        (driver, delay)
    }

    fn feed(driver: &mut RxDriver<SimRadio>, bytes: &[u8]) -> Option<Frame> {
        let _ = driver.radio_mut().load_fifo(bytes);
        let mut last = None;
        for _ in bytes {
            if let Some(frame) = driver.handle(RfEvent::ByteReady) {
                last = Some(frame);
            }
        }
        last
    }

    #[test]
    fn test_init_writes_profile() {
        let mut delay = NoopDelay::new();
        let mut driver = RxDriver::new(SimRadio::new(), Synthesizer::default());
        assert_eq!(driver.init(&mut delay, &SCAN_PROFILE), Ok(0));
        assert_eq!(driver.radio().peek(Register::Deviatn), 0x14);
        assert_eq!(driver.radio().interrupt_clears(), 1);
        assert_eq!(driver.state(), SessionState::Idle);
    }

    #[test]
    fn test_tune_arms_receiver() {
        let (mut driver, _) = listening();
        assert_eq!(driver.state(), SessionState::Listening);
        assert_eq!(driver.radio().state(), MarcState::Rx);
        assert_eq!(driver.radio_mut().freq_words(), FreqWords::from_word(0x21_6bec));
    }

    #[test]
    fn test_receive_frame_then_retune() {
        let (mut driver, mut delay) = listening();
        driver.radio_mut().set_freq_offset(0x07);
        assert_eq!(driver.handle(RfEvent::FrameStart), None);
        let frame = feed(&mut driver, &AIR).unwrap();

        assert_eq!(frame.data(), &[0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80]);
        assert_eq!(frame.rssi(), 0x40);
        assert_eq!(frame.lqi(), 0x15);
        assert_eq!(frame.freq_offset(), 0x07);
        assert_eq!(driver.state(), SessionState::FrameReady);

        let _ = driver.tune(&mut delay, DEFAULT_FREQ_HZ).unwrap();
        assert_eq!(driver.state(), SessionState::Listening);
        assert_eq!(driver.stats().frames, 1);
        assert_eq!(driver.stats().aborted, 0);
    }

    #[test]
    fn test_retune_mid_frame_is_counted() {
        let (mut driver, mut delay) = listening();
        let _ = driver.handle(RfEvent::FrameStart);
        assert_eq!(feed(&mut driver, &AIR[..DATA_BYTES]), None);

        let tuned = driver.tune(&mut delay, 915_000_000).unwrap();

        assert!(tuned.confirmed());
        assert_eq!(driver.state(), SessionState::Listening);
        assert_eq!(driver.stats().aborted, 1);
        // The next frame starts from scratch.
        let _ = driver.handle(RfEvent::FrameStart);
        assert!(feed(&mut driver, &AIR).is_some());
    }

    #[test]
    fn test_out_of_band_tune_keeps_session() {
        let (mut driver, mut delay) = listening();
        driver.radio_mut().clear_strobes();
        assert_eq!(
            driver.tune(&mut delay, 433_920_000),
            Err(RadioError::OutOfBand(433_920_000))
        );
        assert_eq!(driver.state(), SessionState::Listening);
        assert!(driver.radio().strobes().is_empty());
    }

    #[test]
    fn test_overflow_then_recover() {
        let (mut driver, mut delay) = listening();
        let _ = driver.handle(RfEvent::FrameStart);
        let _ = feed(&mut driver, &AIR[..3]);
        assert_eq!(driver.handle(RfEvent::Overflow), None);
        assert!(driver.error());
        assert_eq!(driver.state(), SessionState::OverflowError);

        let _ = driver.tune(&mut delay, DEFAULT_FREQ_HZ).unwrap();
        assert!(!driver.error());
        assert_eq!(driver.stats().overflows, 1);
        assert_eq!(driver.stats().aborted, 0);
    }

    #[test]
    fn test_calibrate_and_sweep_halt_reception() {
        let (mut driver, mut delay) = listening();
        let mut table: ChannelTable<2> = ChannelTable::new();
        let _ = driver.radio_mut().queue_rssi(&[normalize_rssi(12), normalize_rssi(34)]);

        assert_eq!(
            driver.calibrate(&mut table, &mut delay, DEFAULT_FREQ_HZ, 0),
            Ok(DEFAULT_FREQ_HZ)
        );
        assert_eq!(driver.state(), SessionState::Idle);
        assert_eq!(driver.radio().state(), MarcState::Idle);

        let mut samples = 0;
        driver.sweep(&mut table, 0, |_, _| samples += 1);
        assert_eq!(samples, 2);
        assert_eq!(table.get(0).unwrap().max, 34);
        assert_eq!(driver.state(), SessionState::Idle);
    }

    #[test]
    fn test_rssi_now_is_normalized() {
        let (mut driver, _) = listening();
        let _ = driver.radio_mut().queue_rssi(&[0xf0]);
        assert_eq!(driver.rssi_now(), 0x70);
        let radio = driver.release();
        assert_eq!(radio.state(), MarcState::Rx);
    }
}
