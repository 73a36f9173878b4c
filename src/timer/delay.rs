use crate::consts::PAUSE_POLL_MS;
use crate::driver::RxDriver;
use crate::error::RadioError;
use crate::frame::RfEvent;
use crate::mailbox::FrameMailbox;
use crate::monitor::{InputEvent, LoopAction, Monitor, StatusSink};
use crate::radio::RadioControl;
use embedded_hal::delay::DelayNs;

/// Runs the monitor as a blocking, fully polled loop.
///
/// This is for firmware that does not route the radio interrupts to
/// handlers. Each iteration drains the pending radio events reported by
/// `events` into the driver (posting any completed frame to `mailbox`), then
/// runs one [`Monitor::step`] with the next event from `input`.
///
/// # Arguments
/// - `monitor`: main-loop state; [`Monitor::start`] is called first
/// - `driver`: the receive driver
/// - `mailbox`: frame handoff between the event pump and the monitor
/// - `delay`: a delay provider implementing `DelayNs`
/// - `sink`: the display
/// - `input`: returns the next user input, if any
/// - `events`: returns the next pending radio event, if any
///
/// # Returns
/// - `Ok(())` once sleep is requested; the caller powers down and calls
///   [`Monitor::reset`] before running the loop again
/// - `Err(RadioError)` if a tune or calibration was rejected
///
/// # Example
/// ```rust,ignore
/// use wxradio::timer::run_monitor_loop;
/// loop {
///     run_monitor_loop(&mut monitor, &mut driver, &MAILBOX, &mut delay, &mut lcd, keys, rf)?;
///     power_down();
///     monitor.reset();
/// }
/// ```
pub fn run_monitor_loop<R, D, S, I, E, const N: usize>(
    monitor: &mut Monitor<N>,
    driver: &mut RxDriver<R>,
    mailbox: &FrameMailbox,
    delay: &mut D,
    sink: &mut S,
    mut input: I,
    mut events: E,
) -> Result<(), RadioError>
where
    R: RadioControl,
    D: DelayNs,
    S: StatusSink,
    I: FnMut() -> Option<InputEvent>,
    E: FnMut() -> Option<RfEvent>,
{
    monitor.start(driver, delay, sink)?;
    loop {
        while let Some(event) = events() {
            if let Some(frame) = driver.handle(event) {
                let _ = mailbox.post(frame);
            }
        }
        match monitor.step(driver, mailbox, delay, sink, input())? {
            LoopAction::Continue => {}
            LoopAction::Paused => delay.delay_ms(PAUSE_POLL_MS),
            LoopAction::Sleep => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DEFAULT_FREQ_HZ, RX_PROFILE};
    use crate::frame::SessionState;
    use crate::monitor::{MonitorMode, Step};
    use crate::sim::SimRadio;
    use crate::synth::Synthesizer;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use heapless::Deque;

    #[derive(Debug, Default)]
    struct CountingSink {
        puts: u16,
        data_rows: u16,
        clears: u16,
    }

    impl StatusSink for CountingSink {
        fn put(&mut self, row: u8, col: u8, _text: &str) {
            self.puts += 1;
            if (row == 1 || row == 2) && col == 30 {
                self.data_rows += 1;
            }
        }

        fn clear(&mut self) {
            self.clears += 1;
        }
    }

    #[test]
    fn test_loop_receives_then_sleeps() {
        let mut delay = NoopDelay::new();
        let mut driver = RxDriver::new(SimRadio::new(), Synthesizer::default());
        let _ = driver.init(&mut delay, &RX_PROFILE).unwrap();
        let _ = driver.radio_mut().load_fifo(&[0x5a; 10]);
        let mailbox = FrameMailbox::default();
        let mut sink = CountingSink::default();
        let mut monitor: Monitor = Monitor::new(DEFAULT_FREQ_HZ, MonitorMode::Receive);

        let mut rf: Deque<RfEvent, 16> = Deque::new();
        let _ = rf.push_back(RfEvent::FrameStart);
        for _ in 0..10 {
            let _ = rf.push_back(RfEvent::ByteReady);
        }
        let mut keys: Deque<Option<InputEvent>, 8> = Deque::new();
        for key in [
            None,
            Some(InputEvent::Pause),
            Some(InputEvent::Pause),
            Some(InputEvent::Down(Step::Khz1)),
            Some(InputEvent::Sleep),
        ] {
            let _ = keys.push_back(key);
        }

        let result = run_monitor_loop(
            &mut monitor,
            &mut driver,
            &mailbox,
            &mut delay,
            &mut sink,
            || keys.pop_front().flatten(),
            || rf.pop_front(),
        );

        assert_eq!(result, Ok(()));
        assert_eq!(driver.stats().frames, 1);
        assert_eq!(sink.data_rows, 2);
        assert_eq!(sink.clears, 2);
        assert!(sink.puts > 0);
        assert!(!mailbox.is_ready());
        assert_eq!(monitor.center_hz(), DEFAULT_FREQ_HZ - 1_000);
        assert_eq!(driver.state(), SessionState::Listening);
    }
}
