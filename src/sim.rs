//! A register-level transceiver simulation.
//!
//! [`SimRadio`] implements [`RadioControl`] without any hardware so the frame
//! assembler, synthesizer control and sweeps can be exercised on the host or
//! on a board with the radio disconnected. It models:
//!
//! - a register file addressed by the low byte of the XDATA address
//! - state transitions with a configurable number of lagging `MARCSTATE` polls
//! - a "stuck" mode where commanded transitions never complete
//! - autocalibration when leaving IDLE (synthetic `FSCAL` bytes)
//! - a receive FIFO and a queue of scripted RSSI samples
//! - a log of issued strobes

use heapless::{Deque, Vec};

use crate::radio::{CalWords, FreqWords, MarcState, RadioControl, Register, Strobe};

/// Capacity of the simulated receive FIFO.
pub const SIM_FIFO_LEN: usize = 64;

/// Capacity of the scripted RSSI queue.
pub const SIM_RSSI_LEN: usize = 32;

/// Number of strobes remembered by the strobe log.
pub const SIM_STROBE_LOG_LEN: usize = 64;

/// Simulated transceiver.
#[derive(Debug)]
pub struct SimRadio {
    regs: [u8; 64],
    state: MarcState,
    target: Option<MarcState>,
    lag: u16,
    latency: u16,
    stuck: bool,
    fifo: Deque<u8, SIM_FIFO_LEN>,
    rssi_script: Deque<u8, SIM_RSSI_LEN>,
    rssi: u8,
    strobes: Vec<Strobe, SIM_STROBE_LOG_LEN>,
    interrupt_clears: u16,
    calibrations: u16,
}

impl Default for SimRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimRadio {
    /// Creates an idle radio with zeroed registers and instant transitions.
    pub fn new() -> Self {
        Self {
            regs: [0; 64],
            state: MarcState::Idle,
            target: None,
            lag: 0,
            latency: 0,
            stuck: false,
            fifo: Deque::new(),
            rssi_script: Deque::new(),
            rssi: 0,
            strobes: Vec::new(),
            interrupt_clears: 0,
            calibrations: 0,
        }
    }

    /// Makes every commanded transition lag by `polls` reads of `MARCSTATE`.
    pub fn with_latency(mut self, polls: u16) -> Self {
        self.latency = polls;
        self
    }

    /// When stuck, commanded transitions never complete.
    pub fn set_stuck(&mut self, stuck: bool) {
        self.stuck = stuck;
    }

    /// Puts the radio in `state` immediately, cancelling any pending transition.
    pub fn force_state(&mut self, state: MarcState) {
        self.state = state;
        self.target = None;
    }

    /// The state the radio is in right now, without advancing transitions.
    pub fn state(&self) -> MarcState {
        self.state
    }

    /// Queues bytes in the receive FIFO. Returns how many fit.
    pub fn load_fifo(&mut self, bytes: &[u8]) -> usize {
        bytes
            .iter()
            .take_while(|&&b| self.fifo.push_back(b).is_ok())
            .count()
    }

    /// Bytes still waiting in the receive FIFO.
    pub fn fifo_len(&self) -> usize {
        self.fifo.len()
    }

    /// Queues raw RSSI readings returned by successive `RSSI` reads.
    ///
    /// Once the queue is empty the last reading repeats.
    pub fn queue_rssi(&mut self, raw: &[u8]) -> usize {
        raw.iter()
            .take_while(|&&r| self.rssi_script.push_back(r).is_ok())
            .count()
    }

    /// Sets the value of the frequency offset estimate register.
    pub fn set_freq_offset(&mut self, est: u8) {
        self.set_reg(Register::FreqEst, est);
    }

    /// Strobes issued so far, oldest first.
    pub fn strobes(&self) -> &[Strobe] {
        &self.strobes
    }

    /// Forgets the strobe log.
    pub fn clear_strobes(&mut self) {
        self.strobes.clear();
    }

    /// Number of times pending interrupt flags were cleared.
    pub fn interrupt_clears(&self) -> u16 {
        self.interrupt_clears
    }

    /// Number of synthesizer calibrations performed.
    pub fn calibrations(&self) -> u16 {
        self.calibrations
    }

    /// Reads a register without side effects.
    pub fn peek(&self, reg: Register) -> u8 {
        self.regs[Self::index(reg)]
    }

    fn index(reg: Register) -> usize {
        usize::from(reg.address() as u8 & 0x3f)
    }

    fn set_reg(&mut self, reg: Register, value: u8) {
        self.regs[Self::index(reg)] = value;
    }

    // Synthetic but deterministic: the result depends only on the programmed
    // frequency, like the real VCO band search.
    fn calibrate(&mut self) {
        let words = FreqWords {
            freq2: self.peek(Register::Freq2),
            freq1: self.peek(Register::Freq1),
            freq0: self.peek(Register::Freq0),
        };
        let cal = CalWords {
            fscal3: 0xe9,
            fscal2: 0x20 | (words.freq2 & 0x1f),
            fscal1: words.freq1 ^ words.freq0,
        };
        self.set_reg(Register::FsCal3, cal.fscal3);
        self.set_reg(Register::FsCal2, cal.fscal2);
        self.set_reg(Register::FsCal1, cal.fscal1);
        self.calibrations = self.calibrations.wrapping_add(1);
    }

    fn command(&mut self, next: MarcState) {
        if self.stuck {
            self.target = Some(next);
            self.lag = u16::MAX;
        } else if self.latency == 0 {
            self.state = next;
            self.target = None;
        } else {
            self.target = Some(next);
            self.lag = self.latency;
        }
    }

    fn poll_state(&mut self) -> MarcState {
        if let Some(next) = self.target {
            if self.stuck {
                return self.state;
            }
            if self.lag == 0 {
                self.state = next;
                self.target = None;
            } else {
                self.lag -= 1;
            }
        }
        self.state
    }
}

impl RadioControl for SimRadio {
    fn strobe(&mut self, cmd: Strobe) {
        let _ = self.strobes.push(cmd);
        match cmd {
            Strobe::Idle => self.command(MarcState::Idle),
            Strobe::Calibrate => {
                if self.state == MarcState::Idle {
                    self.calibrate();
                }
                self.command(MarcState::Idle);
            }
            Strobe::Rx => {
                if self.state == MarcState::Idle {
                    self.calibrate();
                }
                self.command(MarcState::Rx);
            }
        }
    }

    fn clear_interrupts(&mut self) {
        self.interrupt_clears = self.interrupt_clears.wrapping_add(1);
    }

    fn read_register(&mut self, reg: Register) -> u8 {
        match reg {
            Register::MarcState => self.poll_state().raw(),
            Register::Rssi => {
                if let Some(next) = self.rssi_script.pop_front() {
                    self.rssi = next;
                }
                self.rssi
            }
            _ => self.peek(reg),
        }
    }

    fn write_register(&mut self, reg: Register, value: u8) {
        self.set_reg(reg, value);
    }

    fn read_fifo(&mut self) -> u8 {
        self.fifo.pop_front().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let mut radio = SimRadio::new();
        assert_eq!(radio.marc_state(), MarcState::Idle);
    }

    #[test]
    fn test_rx_strobe_autocalibrates_from_idle() {
        let mut radio = SimRadio::new();
        radio.write_freq_words(FreqWords::from_word(0x21_6bec));
        radio.strobe(Strobe::Rx);
        assert_eq!(radio.marc_state(), MarcState::Rx);
        assert_eq!(radio.calibrations(), 1);
        assert_eq!(
            radio.cal_words(),
            CalWords {
                fscal3: 0xe9,
                fscal2: 0x21,
                fscal1: 0x6b ^ 0xec,
            }
        );
        // Already in RX: no second calibration.
        radio.strobe(Strobe::Rx);
        assert_eq!(radio.calibrations(), 1);
    }

    #[test]
    fn test_latency_delays_transition() {
        let mut radio = SimRadio::new().with_latency(2);
        radio.strobe(Strobe::Rx);
        assert_eq!(radio.marc_state(), MarcState::Idle);
        assert_eq!(radio.marc_state(), MarcState::Idle);
        assert_eq!(radio.marc_state(), MarcState::Rx);
    }

    #[test]
    fn test_fifo_and_rssi_script() {
        let mut radio = SimRadio::new();
        assert_eq!(radio.load_fifo(&[1, 2]), 2);
        assert_eq!(radio.read_fifo(), 1);
        assert_eq!(radio.read_fifo(), 2);
        assert_eq!(radio.read_fifo(), 0);

        assert_eq!(radio.queue_rssi(&[0x10, 0x20]), 2);
        assert_eq!(radio.rssi(), 0x10);
        assert_eq!(radio.rssi(), 0x20);
        assert_eq!(radio.rssi(), 0x20);
    }

    #[test]
    fn test_strobe_log() {
        let mut radio = SimRadio::new();
        radio.strobe(Strobe::Calibrate);
        radio.strobe(Strobe::Rx);
        radio.strobe(Strobe::Idle);
        assert_eq!(radio.strobes(), &[Strobe::Calibrate, Strobe::Rx, Strobe::Idle]);
        radio.clear_strobes();
        assert!(radio.strobes().is_empty());
    }

    #[test]
    fn test_profile_lands_in_register_file() {
        let mut radio = SimRadio::new();
        radio.apply_profile(&crate::consts::RX_PROFILE);
        assert_eq!(radio.peek(Register::Sync1), 0xcb);
        assert_eq!(radio.peek(Register::Sync0), 0x89);
        assert_eq!(radio.peek(Register::PktLen), 8);
        assert_eq!(radio.peek(Register::PktCtrl0), 0x00);
    }
}
