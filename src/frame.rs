//! Fixed-length frame acquisition.
//!
//! The packet engine raises three kinds of events while the radio is in RX:
//! a start-of-frame delimiter when the sync word matches, one byte-ready event
//! per byte in the receive FIFO, and an overflow when the FIFO was not drained
//! in time. [`FrameAssembler`] turns that event stream into complete
//! [`Frame`]s:
//!
//! ```text
//!  Idle ──tune──> Calibrating ──armed──> Listening ──SFD──> Receiving
//!                                            ^                  │ 10 bytes
//!                                            │ rearm            v
//!                                      FrameReady <─────────────┘
//!  any (not Idle) ──overflow──> OverflowError ──rearm──> Listening
//! ```
//!
//! Each data byte is bit-reversed as it lands (the transmitter sends LSB
//! first). Once the two hardware status bytes have arrived the radio is forced
//! to IDLE, the RSSI byte is normalized, the stale checksum flag is cleared
//! from the LQI byte, and the frequency offset estimate is appended. The
//! assembler then returns the frame exactly once.
//!
//! The assembler holds no hardware itself; every method takes the radio it
//! should talk to, so it runs against [`SimRadio`](crate::sim::SimRadio) in
//! tests.

use core::fmt;

use heapless::Vec;

use crate::consts::{
    CRC_SPAN, DATA_BYTES, FRAME_LEN, FREQ_EST_INDEX, ISR_STATE_POLLS, LQI_INDEX, RFIF_IRQ_RXOVF,
    RFIF_IRQ_SFD, RSSI_INDEX,
};
use crate::crc::crc16_ccitt;
use crate::encoding::{clear_crc_flag, normalize_rssi, reverse_bits};
use crate::radio::{MarcState, RadioControl, Strobe};
use crate::timer::spin_state;

/// A complete, bit-corrected frame with its quality metadata.
///
/// Layout: 8 data bytes, normalized RSSI, LQI without the checksum flag,
/// frequency offset estimate.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Frame([u8; FRAME_LEN]);

impl Frame {
    /// Wraps already-processed bytes.
    pub const fn from_bytes(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    /// All 11 bytes.
    pub const fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// The 8 data bytes, MSB-first.
    pub fn data(&self) -> &[u8] {
        &self.0[..DATA_BYTES]
    }

    /// Normalized signal strength (larger is stronger).
    pub const fn rssi(&self) -> u8 {
        self.0[RSSI_INDEX]
    }

    /// Link quality indicator.
    pub const fn lqi(&self) -> u8 {
        self.0[LQI_INDEX]
    }

    /// Frequency offset estimate sampled after the frame.
    pub const fn freq_offset(&self) -> u8 {
        self.0[FREQ_EST_INDEX]
    }

    /// CRC16-CCITT over the leading data bytes, for display.
    pub fn checksum(&self) -> u16 {
        crc16_ccitt(&self.0[..CRC_SPAN])
    }

    /// The checksum the transmitter placed after the covered bytes.
    pub const fn embedded_checksum(&self) -> u16 {
        u16::from_be_bytes([self.0[CRC_SPAN], self.0[CRC_SPAN + 1]])
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, b) in self.data().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{b:02x}")?;
        }
        write!(
            f,
            " rssi={} lqi={} offset={}",
            self.rssi(),
            self.lqi(),
            self.freq_offset()
        )
    }
}

/// Receive session state shared between interrupt and main context.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SessionState {
    /// Radio idle; events are ignored.
    #[default]
    Idle,
    /// Synthesizer being retuned or calibrated.
    Calibrating,
    /// Armed and waiting for a start-of-frame delimiter.
    Listening,
    /// Collecting bytes of a frame.
    Receiving,
    /// A frame was completed; the radio sits in IDLE until re-armed.
    FrameReady,
    /// The receive FIFO overflowed; the radio sits in IDLE until re-armed.
    OverflowError,
}

/// Events raised by the packet engine.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RfEvent {
    /// The sync word matched: a frame is starting.
    FrameStart,
    /// One byte is waiting in the receive FIFO.
    ByteReady,
    /// The receive FIFO overflowed.
    Overflow,
}

impl RfEvent {
    /// Decodes the general RF interrupt flags (`RFIF`).
    ///
    /// A start-of-frame delimiter is reported before an overflow, matching the
    /// order they have to be serviced in. Byte-ready events arrive on their own
    /// vector and are not part of `RFIF`.
    pub fn from_rfif(flags: u8) -> Vec<RfEvent, 2> {
        let mut events = Vec::new();
        if flags & RFIF_IRQ_SFD != 0 {
            let _ = events.push(RfEvent::FrameStart);
        }
        if flags & RFIF_IRQ_RXOVF != 0 {
            let _ = events.push(RfEvent::Overflow);
        }
        events
    }
}

/// Running receive counters. All counters wrap.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RxStats {
    /// Frames completed and handed out.
    pub frames: u16,
    /// FIFO overflows.
    pub overflows: u16,
    /// Partial frames abandoned by a re-arm.
    pub aborted: u16,
    /// Bytes read while not receiving a frame.
    pub dropped_bytes: u16,
    /// Byte-ready events raised while the radio was not in RX.
    pub spurious: u16,
}

/// Interrupt-driven frame assembler.
#[derive(Debug)]
pub struct FrameAssembler {
    state: SessionState,
    buf: [u8; FRAME_LEN],
    cursor: usize,
    error: bool,
    stats: RxStats,
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAssembler {
    /// Creates an idle assembler with an empty buffer.
    pub const fn new() -> Self {
        Self {
            state: SessionState::Idle,
            buf: [0; FRAME_LEN],
            cursor: 0,
            error: false,
            stats: RxStats {
                frames: 0,
                overflows: 0,
                aborted: 0,
                dropped_bytes: 0,
                spurious: 0,
            },
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Write position in the frame buffer.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether an error (overflow or byte outside RX) has been flagged since
    /// the last re-arm.
    pub fn error(&self) -> bool {
        self.error
    }

    /// Receive counters.
    pub fn stats(&self) -> RxStats {
        self.stats
    }

    /// Marks the radio as idle; further events are ignored.
    pub fn halt(&mut self) {
        self.abandon_partial();
        self.state = SessionState::Idle;
    }

    /// Marks the synthesizer as being retuned or calibrated.
    pub fn begin_calibration(&mut self) {
        self.abandon_partial();
        self.state = SessionState::Calibrating;
    }

    /// Re-arms for the next frame: clears the error flag, resets the cursor
    /// and starts listening.
    ///
    /// A frame that was still being received is abandoned and counted in
    /// [`RxStats::aborted`].
    pub fn rearm(&mut self) {
        self.abandon_partial();
        self.cursor = 0;
        self.error = false;
        self.state = SessionState::Listening;
    }

    fn abandon_partial(&mut self) {
        if self.state == SessionState::Receiving && self.cursor > 0 {
            self.stats.aborted = self.stats.aborted.wrapping_add(1);
            debug!("abandoned partial frame at byte {}", self.cursor);
        }
    }

    /// Dispatches one event.
    pub fn handle<R: RadioControl>(&mut self, radio: &mut R, event: RfEvent) -> Option<Frame> {
        match event {
            RfEvent::FrameStart => {
                self.frame_start();
                None
            }
            RfEvent::ByteReady => self.byte_ready(radio),
            RfEvent::Overflow => {
                self.overflow(radio);
                None
            }
        }
    }

    /// Handles a start-of-frame delimiter.
    ///
    /// Only meaningful while armed; a delimiter in the middle of a frame
    /// restarts it.
    pub fn frame_start(&mut self) {
        match self.state {
            SessionState::Listening | SessionState::Receiving => {
                self.cursor = 0;
                self.state = SessionState::Receiving;
            }
            other => trace!("frame start ignored in {:?}", other),
        }
    }

    /// Handles one byte-ready event, returning the frame once it completes.
    pub fn byte_ready<R: RadioControl>(&mut self, radio: &mut R) -> Option<Frame> {
        if radio.marc_state() != MarcState::Rx {
            self.error = true;
            self.stats.spurious = self.stats.spurious.wrapping_add(1);
            return None;
        }

        let byte = radio.read_fifo();
        if self.state != SessionState::Receiving || self.cursor >= FRAME_LEN - 1 {
            self.stats.dropped_bytes = self.stats.dropped_bytes.wrapping_add(1);
            trace!("dropped byte in {:?}", self.state);
            return None;
        }

        self.buf[self.cursor] = if self.cursor < DATA_BYTES {
            reverse_bits(byte)
        } else {
            byte
        };
        self.cursor += 1;

        if self.cursor == FRAME_LEN - 1 {
            Some(self.finish(radio))
        } else {
            None
        }
    }

    /// Handles a receive FIFO overflow.
    ///
    /// Forces the radio to IDLE, discards the partial frame and flags the
    /// error. Nothing is received until the next re-arm. Ignored unless the
    /// session is armed; a finished frame stays ready.
    pub fn overflow<R: RadioControl>(&mut self, radio: &mut R) {
        if !matches!(
            self.state,
            SessionState::Listening | SessionState::Receiving | SessionState::Calibrating
        ) {
            trace!("overflow ignored in {:?}", self.state);
            return;
        }
        radio.strobe(Strobe::Idle);
        let _ = spin_state(radio, MarcState::Idle, ISR_STATE_POLLS);
        self.cursor = 0;
        self.error = true;
        self.state = SessionState::OverflowError;
        self.stats.overflows = self.stats.overflows.wrapping_add(1);
        warn!("receive FIFO overflow");
    }

    // The offset estimate is only valid once the demodulator has stopped.
    fn finish<R: RadioControl>(&mut self, radio: &mut R) -> Frame {
        radio.strobe(Strobe::Idle);
        let _ = spin_state(radio, MarcState::Idle, ISR_STATE_POLLS);

        self.buf[RSSI_INDEX] = normalize_rssi(self.buf[RSSI_INDEX]);
        self.buf[LQI_INDEX] = clear_crc_flag(self.buf[LQI_INDEX]);
        self.buf[FREQ_EST_INDEX] = radio.freq_offset();

        self.state = SessionState::FrameReady;
        self.stats.frames = self.stats.frames.wrapping_add(1);
        debug!("frame complete, rssi {}", self.buf[RSSI_INDEX]);
        Frame(self.buf)
    }
}
