use crate::driver::RxDriver;
use crate::frame::RfEvent;
use crate::mailbox::{FrameMailbox, PostOutcome};
use crate::radio::RadioControl;
use crate::synth::Synthesizer;
use core::cell::RefCell;
use critical_section::Mutex;

/// A receive driver shared between the RF interrupt handlers and `main`.
pub type GlobalRxDriver<R> = Mutex<RefCell<Option<RxDriver<R>>>>;

/// Used to initialize the global static `RxDriver` for use with
/// `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```rust
/// use wxradio::sim::SimRadio;
/// use wxradio::timer::{GlobalRxDriver, global_rx_driver_init};
///
/// static RX_DRIVER: GlobalRxDriver<SimRadio> = global_rx_driver_init::<SimRadio>();
/// ```
pub const fn global_rx_driver_init<R: RadioControl>() -> GlobalRxDriver<R> {
    Mutex::new(RefCell::new(None))
}

/// Moves a radio into the global driver, replacing any previous one.
///
/// # Arguments
/// * The global static `RxDriver`
/// * The radio
/// * The synthesizer settings
///
/// # Example
/// ```rust
/// # use wxradio::sim::SimRadio;
/// # use wxradio::synth::Synthesizer;
/// # use wxradio::timer::{GlobalRxDriver, global_rx_driver_init, global_rx_driver_setup};
/// # static RX_DRIVER: GlobalRxDriver<SimRadio> = global_rx_driver_init::<SimRadio>();
/// global_rx_driver_setup(&RX_DRIVER, SimRadio::new(), Synthesizer::default());
/// ```
pub fn global_rx_driver_setup<R: RadioControl>(
    global_driver: &'static GlobalRxDriver<R>,
    radio: R,
    synth: Synthesizer,
) {
    critical_section::with(|cs| {
        let _ = global_driver
            .borrow(cs)
            .replace(Some(RxDriver::new(radio, synth)));
    });
}

/// Services one radio event from an interrupt handler.
///
/// A completed frame is posted to `mailbox`. Does nothing if the driver has
/// not been set up yet.
///
/// # Returns
/// The mailbox outcome if a frame completed.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn RFTXRX() {
///     global_rf_event(&RX_DRIVER, &MAILBOX, RfEvent::ByteReady);
/// }
/// ```
pub fn global_rf_event<R: RadioControl>(
    global_driver: &'static GlobalRxDriver<R>,
    mailbox: &FrameMailbox,
    event: RfEvent,
) -> Option<PostOutcome> {
    let frame = critical_section::with(|cs| {
        global_driver
            .borrow(cs)
            .borrow_mut()
            .as_mut()
            .and_then(|driver| driver.handle(event))
    })?;
    Some(mailbox.post(frame))
}

/// Runs `f` on the global driver inside a critical section.
///
/// Interrupt handlers cannot run while `f` does, so a retune through here is
/// never interleaved with frame reception.
///
/// # Returns
/// `None` if the driver has not been set up yet.
pub fn with_rx_driver<R, T, F>(global_driver: &'static GlobalRxDriver<R>, f: F) -> Option<T>
where
    R: RadioControl,
    F: FnOnce(&mut RxDriver<R>) -> T,
{
    critical_section::with(|cs| global_driver.borrow(cs).borrow_mut().as_mut().map(f))
}
