//! Bounded waits and interrupt/loop plumbing.
//!
//! Hardware state changes (IDLE, RX) are confirmed by polling `MARCSTATE` a
//! bounded number of times. Main-context waits sleep 1 ms between polls using
//! an `embedded_hal::delay::DelayNs`; interrupt-context waits spin on the
//! register without sleeping. Either way the outcome is returned as a
//! [`WaitResult`] and the caller decides whether a timeout matters.
//!
//! Contains:
//! - [`wait_state`]: delay-paced poll for main context
//! - [`spin_state`]: spin poll for interrupt context
//! - [`dwell`]: fixed busy loop used between RX strobe and RSSI sample
//! - `global_rx_driver_*` and `rf_event!()`: interrupt glue (feature `rf-isr`)
//! - `run_monitor_loop`: blocking polled main loop (feature `delay-loop`)

use embedded_hal::delay::DelayNs;

use crate::error::{RadioError, WaitResult};
use crate::radio::{MarcState, RadioControl};

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "rf-isr")]
mod isr;
#[cfg_attr(feature = "rf-isr", allow(unused_imports))]
#[cfg(feature = "rf-isr")]
pub use isr::*;

#[cfg(feature = "rf-isr")]
mod macros;
#[cfg_attr(feature = "rf-isr", allow(unused_imports))]
#[cfg(feature = "rf-isr")]
pub use macros::*;

/// Polls the radio until it reports `expected`, sleeping 1 ms between polls.
///
/// # Arguments
/// - `radio`: the transceiver to poll
/// - `delay`: tick source for the 1 ms sleeps
/// - `expected`: the state to wait for
/// - `max_ticks`: number of 1 ms sleeps allowed before giving up
///
/// # Returns
/// - `Ok(ticks)`: the state was reached after `ticks` sleeps
/// - `Err(RadioError::StateTimeout)`: the budget ran out
pub fn wait_state<R, D>(
    radio: &mut R,
    delay: &mut D,
    expected: MarcState,
    max_ticks: u16,
) -> WaitResult
where
    R: RadioControl,
    D: DelayNs,
{
    let mut last = radio.marc_state();
    let mut ticks: u16 = 0;
    while last != expected {
        if ticks >= max_ticks {
            warn!("state wait timed out after {} ticks", ticks);
            return Err(RadioError::StateTimeout {
                expected,
                last,
                ticks,
            });
        }
        delay.delay_ms(1);
        ticks += 1;
        last = radio.marc_state();
    }
    Ok(ticks)
}

/// Polls the radio until it reports `expected`, without sleeping.
///
/// Safe to call from an interrupt handler: it never blocks on anything but the
/// register read itself and gives up after `max_polls` extra reads.
pub fn spin_state<R: RadioControl>(radio: &mut R, expected: MarcState, max_polls: u16) -> WaitResult {
    let mut last = radio.marc_state();
    let mut polls: u16 = 0;
    while last != expected {
        if polls >= max_polls {
            warn!("state spin timed out after {} polls", polls);
            return Err(RadioError::StateTimeout {
                expected,
                last,
                ticks: polls,
            });
        }
        core::hint::spin_loop();
        polls += 1;
        last = radio.marc_state();
    }
    Ok(polls)
}

/// Busy-waits for roughly `spins` loop iterations.
///
/// Used to let the receiver settle before an RSSI sample. The duration depends
/// on the core clock and is not calibrated.
pub fn dwell(spins: u16) {
    for _ in 0..spins {
        core::hint::spin_loop();
    }
}
