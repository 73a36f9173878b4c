//! The frame monitor / spectrum sweep main loop.
//!
//! [`Monitor`] is the consumer side of the receiver. It owns the user-facing
//! state (center and requested frequency, pause and sleep flags) and the
//! channel table, reads user input, renders to a character display through a
//! [`StatusSink`] and tells the [`RxDriver`] what to do next.
//!
//! One call to [`Monitor::step`] is one iteration of the main loop:
//!
//! 1. apply the pending input event, if any
//! 2. stop early when sleeping or paused
//! 3. in [`MonitorMode::Receive`]: show a received frame and re-arm, show the
//!    live RSSI, retune if the user changed the frequency
//! 4. in [`MonitorMode::Sweep`]: recalibrate if the user changed the
//!    frequency, then sweep every channel and show its RSSI
//!
//! Display layout (row, column in pixels of a 132x64 panel):
//!
//! ```text
//! Receive                          Sweep
//! 0  Freq: <hz>    Chan: <ch>      0  Freq: <hz>    Chan: <ch>
//! 1  Data: xx xx xx xx             1   0x<freq>  Cal:0x<cal>
//! 2        xx xx xx xx             2  RSSI: <cur>   Max: <max>
//! 3  CRC: xxxx
//! 4  LQI: <lqi>
//! 5  RSSI: <rssi>  NOW: <live>
//! 6  OFFSET: <est>
//! ```

use core::fmt::{self, Write};

use embedded_hal::delay::DelayNs;
use heapless::String;

use crate::channel::{ChannelEntry, ChannelTable};
use crate::consts::{
    DEFAULT_FREQ_HZ, NUM_CHANNELS, STEP_1KHZ, STEP_1MHZ, STEP_10KHZ, STEP_100KHZ,
    SWEEP_DWELL_SPINS,
};
use crate::driver::RxDriver;
use crate::error::RadioError;
use crate::frame::{Frame, SessionState};
use crate::mailbox::FrameMailbox;
use crate::radio::RadioControl;
use crate::synth::Band;

/// Longest field rendered in one [`StatusSink::put`] call.
pub const FIELD_LEN: usize = 24;

/// Frequency step sizes selectable from the keypad.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Step {
    /// 1 kHz.
    Khz1,
    /// 10 kHz.
    Khz10,
    /// 100 kHz.
    Khz100,
    /// 1 MHz.
    Mhz1,
}

impl Step {
    /// Step size in Hz.
    pub const fn hz(self) -> u32 {
        match self {
            Step::Khz1 => STEP_1KHZ,
            Step::Khz10 => STEP_10KHZ,
            Step::Khz100 => STEP_100KHZ,
            Step::Mhz1 => STEP_1MHZ,
        }
    }
}

/// A discrete user input.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum InputEvent {
    /// Raise the requested frequency.
    Up(Step),
    /// Lower the requested frequency.
    Down(Step),
    /// Toggle pause.
    Pause,
    /// Power down; the caller resets the monitor on wake.
    Sleep,
}

/// A character display addressed by row and pixel column.
///
/// Rendering failures are the sink's own business.
pub trait StatusSink {
    /// Writes `text` starting at `row`, `col`.
    fn put(&mut self, row: u8, col: u8, text: &str);

    /// Blanks the display.
    fn clear(&mut self);
}

/// What the monitor does with the radio.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum MonitorMode {
    /// Receive and display frames on one frequency.
    #[default]
    Receive,
    /// Sample RSSI on every channel of the table.
    Sweep,
}

/// Result of one [`Monitor::step`].
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum LoopAction {
    /// Keep looping.
    Continue,
    /// Paused; nothing was done. Poll input again after a short sleep.
    Paused,
    /// Sleep was requested and the display cleared. Power down, then call
    /// [`Monitor::reset`] and [`Monitor::start`] on wake.
    Sleep,
}

/// Main-loop state.
#[derive(Debug)]
pub struct Monitor<const N: usize = NUM_CHANNELS> {
    mode: MonitorMode,
    band: Band,
    default_hz: u32,
    center_hz: u32,
    user_hz: u32,
    channel: usize,
    paused: bool,
    sleepy: bool,
    table: ChannelTable<N>,
}

impl<const N: usize> Default for Monitor<N> {
    fn default() -> Self {
        Self::new(DEFAULT_FREQ_HZ, MonitorMode::default())
    }
}

impl<const N: usize> Monitor<N> {
    /// Creates a monitor that starts at `default_hz`.
    pub fn new(default_hz: u32, mode: MonitorMode) -> Self {
        Self {
            mode,
            band: Band::BAND_900,
            default_hz,
            center_hz: default_hz,
            user_hz: default_hz,
            channel: 0,
            paused: false,
            sleepy: false,
            table: ChannelTable::new(),
        }
    }

    /// Replaces the band user input is clamped to.
    pub fn with_band(mut self, band: Band) -> Self {
        self.band = band;
        self
    }

    /// Operating mode.
    pub fn mode(&self) -> MonitorMode {
        self.mode
    }

    /// Frequency the radio is tuned or calibrated to.
    pub fn center_hz(&self) -> u32 {
        self.center_hz
    }

    /// Frequency the user asked for; applied on the next step.
    pub fn user_hz(&self) -> u32 {
        self.user_hz
    }

    /// Whether the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// The channel table.
    pub fn table(&self) -> &ChannelTable<N> {
        &self.table
    }

    /// Restores power-on defaults. Calibrations are forgotten.
    pub fn reset(&mut self) {
        self.center_hz = self.default_hz;
        self.user_hz = self.default_hz;
        self.channel = 0;
        self.paused = false;
        self.sleepy = false;
        self.table = ChannelTable::new();
    }

    /// Applies one input event.
    ///
    /// Frequency steps are clamped to the band; the radio is not touched
    /// until the next [`step`](Monitor::step).
    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::Up(step) => {
                self.user_hz = self.band.clamp(self.user_hz.saturating_add(step.hz()));
            }
            InputEvent::Down(step) => {
                self.user_hz = self.band.clamp(self.user_hz.saturating_sub(step.hz()));
            }
            InputEvent::Pause => self.paused = !self.paused,
            InputEvent::Sleep => self.sleepy = true,
        }
    }

    /// Draws the static labels and tunes (or calibrates) to the center
    /// frequency.
    pub fn start<R, D, S>(
        &mut self,
        driver: &mut RxDriver<R>,
        delay: &mut D,
        sink: &mut S,
    ) -> Result<(), RadioError>
    where
        R: RadioControl,
        D: DelayNs,
        S: StatusSink,
    {
        sink.clear();
        match self.mode {
            MonitorMode::Receive => {
                sink.put(0, 0, "Freq:          Chan:");
                sink.put(1, 0, "Data:");
                sink.put(3, 0, "CRC:");
                sink.put(4, 0, "LQI:");
                sink.put(5, 0, "RSSI:    NOW:");
                sink.put(6, 0, "OFFSET:");
            }
            MonitorMode::Sweep => {
                sink.put(0, 0, "Freq:          Chan:");
                sink.put(1, 0, " 0x       Cal:0x");
                sink.put(2, 0, "RSSI:     Max:");
            }
        }
        self.retune(driver, delay, sink, self.center_hz)
    }

    /// Runs one iteration of the main loop.
    ///
    /// With `rf-isr` the driver sits in a global, so each call runs inside
    /// [`with_rx_driver`](crate::timer::with_rx_driver) and the RF interrupts
    /// are masked for its duration. Call it once per iteration, never around
    /// the whole loop, and do the pause sleep and input polling outside:
    ///
    /// ```rust,ignore
    /// loop {
    ///     let key = keypad.poll();
    ///     let action = with_rx_driver(&RX_DRIVER, |d| {
    ///         monitor.step(d, &MAILBOX, &mut delay, &mut lcd, key)
    ///     });
    ///     match action {
    ///         Some(Ok(LoopAction::Paused)) => delay.delay_ms(PAUSE_POLL_MS),
    ///         Some(Ok(LoopAction::Sleep)) => break,
    ///         _ => {}
    ///     }
    /// }
    /// ```
    ///
    /// A step blocks for at most one bounded retune wait, or one sweep in
    /// [`MonitorMode::Sweep`]. Frames finished by the interrupt handlers wait
    /// in the mailbox meanwhile. If the display is too slow to drive with
    /// interrupts masked, keep the driver out of the global and use
    /// [`run_monitor_loop`](crate::timer::run_monitor_loop) instead.
    ///
    /// # Returns
    /// - `Err(RadioError)` if a retune or calibration was rejected
    /// - `Ok(LoopAction)` otherwise
    pub fn step<R, D, S>(
        &mut self,
        driver: &mut RxDriver<R>,
        mailbox: &FrameMailbox,
        delay: &mut D,
        sink: &mut S,
        input: Option<InputEvent>,
    ) -> Result<LoopAction, RadioError>
    where
        R: RadioControl,
        D: DelayNs,
        S: StatusSink,
    {
        if let Some(event) = input {
            self.apply(event);
        }
        if self.sleepy {
            sink.clear();
            debug!("sleep requested");
            return Ok(LoopAction::Sleep);
        }
        if self.paused {
            return Ok(LoopAction::Paused);
        }

        match self.mode {
            MonitorMode::Receive => {
                if let Ok(frame) = mailbox.poll() {
                    show_frame(sink, &frame);
                    self.retune(driver, delay, sink, self.center_hz)?;
                } else if driver.state() == SessionState::OverflowError {
                    self.retune(driver, delay, sink, self.center_hz)?;
                }

                let live = driver.rssi_now();
                put_fmt(sink, 5, 78, format_args!("{live:3}"));

                if self.user_hz != self.center_hz {
                    self.retune(driver, delay, sink, self.user_hz)?;
                }
            }
            MonitorMode::Sweep => {
                if self.user_hz != self.center_hz {
                    self.retune(driver, delay, sink, self.user_hz)?;
                }
                driver.sweep(&mut self.table, SWEEP_DWELL_SPINS, |_, entry| {
                    show_strength(sink, entry)
                });
            }
        }
        Ok(LoopAction::Continue)
    }

    // Receive: retune and re-arm. Sweep: recalibrate the current channel.
    // Either way the channel's signal history starts over.
    fn retune<R, D, S>(
        &mut self,
        driver: &mut RxDriver<R>,
        delay: &mut D,
        sink: &mut S,
        hz: u32,
    ) -> Result<(), RadioError>
    where
        R: RadioControl,
        D: DelayNs,
        S: StatusSink,
    {
        match self.mode {
            MonitorMode::Receive => {
                let tuned = driver.tune(delay, hz)?;
                if let Err(e) = tuned.check() {
                    warn!("retune to {} Hz not confirmed: {:?}", hz, e);
                }
                self.table.reset_stats(self.channel)?;
            }
            MonitorMode::Sweep => {
                let _ = driver.calibrate(&mut self.table, delay, hz, self.channel)?;
                if let Some(entry) = self.table.get(self.channel) {
                    show_calibration(sink, entry);
                }
            }
        }
        self.center_hz = hz;
        self.user_hz = hz;
        show_frequency(sink, hz, self.channel);
        Ok(())
    }
}

fn put_fmt<S: StatusSink>(sink: &mut S, row: u8, col: u8, args: fmt::Arguments<'_>) {
    let mut text: String<FIELD_LEN> = String::new();
    // An overlong field is shown truncated.
    let _ = text.write_fmt(args);
    sink.put(row, col, &text);
}

fn show_frequency<S: StatusSink>(sink: &mut S, hz: u32, ch: usize) {
    put_fmt(sink, 0, 30, format_args!("{hz}"));
    put_fmt(sink, 0, 120, format_args!("{ch:2}"));
}

fn show_frame<S: StatusSink>(sink: &mut S, frame: &Frame) {
    debug!("frame {}", frame);
    let d = frame.data();
    put_fmt(
        sink,
        1,
        30,
        format_args!("{:02x} {:02x} {:02x} {:02x}", d[0], d[1], d[2], d[3]),
    );
    put_fmt(
        sink,
        2,
        30,
        format_args!("{:02x} {:02x} {:02x} {:02x}", d[4], d[5], d[6], d[7]),
    );
    put_fmt(sink, 3, 24, format_args!("{:04x}", frame.checksum()));
    put_fmt(sink, 4, 24, format_args!("{:3} ", frame.lqi()));
    put_fmt(sink, 5, 30, format_args!("{:3} ", frame.rssi()));
    put_fmt(sink, 6, 42, format_args!("{:3} ", frame.freq_offset()));
}

fn show_calibration<S: StatusSink>(sink: &mut S, entry: &ChannelEntry) {
    let f = entry.freq;
    let c = entry.cal;
    put_fmt(
        sink,
        1,
        18,
        format_args!("{:02x}{:02x}{:02x}", f.freq2, f.freq1, f.freq0),
    );
    put_fmt(
        sink,
        1,
        96,
        format_args!("{:02x}{:02x}{:02x}", c.fscal3, c.fscal2, c.fscal1),
    );
}

fn show_strength<S: StatusSink>(sink: &mut S, entry: &ChannelEntry) {
    put_fmt(sink, 2, 30, format_args!("{:3}", entry.current));
    put_fmt(sink, 2, 84, format_args!("{:3}", entry.max));
}
