//! # wxradio
//!
//! A portable, no_std receive path for CC1110-class sub-GHz packet transceivers,
//! as found in small handheld weather-station receivers.
//!
//! This crate implements:
//! - frequency synthesizer tuning with bounded, explicitly reported state waits
//! - per-channel calibration storage and RSSI sweeps
//! - an interrupt-driven fixed-length frame assembler (8 data bytes plus
//!   RSSI, LQI and a frequency offset estimate)
//! - a single-slot frame mailbox with an explicit overwrite policy
//! - a frame monitor / spectrum sweep main loop that renders to any character
//!   display
//!
//! Hardware access goes through the narrow [`radio::RadioControl`] trait, so
//! everything above it runs unchanged against [`sim::SimRadio`].
//!
//! ## Crate features
//! | Feature            | Description |
//! |--------------------|-------------|
//! | `std`              | Disables `#![no_std]` and forwards `std` to `thiserror`, `critical-section` and `log` |
//! | `rf-isr` (default) | Global `critical_section::Mutex` driver helpers and macros for interrupt handlers |
//! | `delay-loop`       | Blocking, fully polled main loop driven by `embedded_hal::delay::DelayNs` |
//! | `defmt-0-3`        | Uses `defmt` logging |
//! | `log`              | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! use wxradio::consts::{DEFAULT_FREQ_HZ, RX_PROFILE};
//! use wxradio::driver::RxDriver;
//! use wxradio::frame::RfEvent;
//! use wxradio::mailbox::{FrameMailbox, OverwritePolicy};
//! use wxradio::sim::SimRadio;
//! use wxradio::synth::Synthesizer;
//!
//! static MAILBOX: FrameMailbox = FrameMailbox::new(OverwritePolicy::Overwrite);
//!
//! let mut delay = NoopDelay::new();
//! let mut driver = RxDriver::new(SimRadio::new(), Synthesizer::default());
//! driver.init(&mut delay, &RX_PROFILE).unwrap();
//! driver.tune(&mut delay, DEFAULT_FREQ_HZ).unwrap();
//!
//! // In the RF interrupt handlers:
//! if let Some(frame) = driver.handle(RfEvent::FrameStart) {
//!     MAILBOX.post(frame);
//! }
//!
//! // In the main loop:
//! if let Ok(frame) = MAILBOX.poll() {
//!     // render, then re-arm
//! #   let _ = frame;
//! }
//! ```
//!
//! With `rf-isr`, keep the driver in a static and use
//! [`init_rx_driver!`], [`setup_rx_driver!`] and [`rf_event!`] from the
//! interrupt handlers; see [`timer`].
//!
//! ## Integration Notes
//!
//! - Only one driver instance should be active at a time in interrupt-driven mode
//! - Tuning reports timeouts instead of failing; check [`synth::Tuned::confirmed`]
//! - A retune abandons a partially received frame and counts it in
//!   [`frame::RxStats::aborted`]
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

pub use critical_section;
pub use heapless;

#[macro_use]
mod fmt;

pub mod channel;
pub mod consts;
pub mod crc;
pub mod driver;
pub mod encoding;
pub mod error;
pub mod frame;
pub mod mailbox;
pub mod monitor;
pub mod radio;
pub mod sim;
pub mod synth;
pub mod timer;
