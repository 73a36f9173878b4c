/// Declares a static global `RX_DRIVER` instance protected by a `critical_section` mutex.
///
/// This macro creates a `static` singleton `RX_DRIVER` suitable for use in
/// interrupt-based environments, where both the main thread and the RF
/// interrupt handlers need to safely access the shared driver state.
///
/// # Arguments
/// - `$radio`: The concrete radio type (must implement `RadioControl`)
///
/// # Example
/// ```rust
/// # use wxradio::init_rx_driver;
/// init_rx_driver!(wxradio::sim::SimRadio);
/// ```
#[macro_export]
macro_rules! init_rx_driver {
    ( $radio:ty ) => {
        pub static RX_DRIVER: $crate::timer::GlobalRxDriver<$radio> =
            $crate::timer::global_rx_driver_init::<$radio>();
    };
}

/// Initializes the global `RX_DRIVER` singleton with a new driver instance.
///
/// # Arguments
/// - `$radio`: The radio (must implement `RadioControl`)
/// - `$synth`: Optional `Synthesizer` settings; defaults to a 27 MHz reference
///
/// # Example
/// ```rust
/// # use wxradio::{init_rx_driver, setup_rx_driver};
/// # init_rx_driver!(wxradio::sim::SimRadio);
/// let radio = wxradio::sim::SimRadio::new();
/// setup_rx_driver!(radio);
/// ```
///
/// # Notes
/// - Requires `init_rx_driver!` to have been used earlier.
#[macro_export]
macro_rules! setup_rx_driver {
    ( $radio:expr ) => {
        $crate::setup_rx_driver!($radio, $crate::synth::Synthesizer::default())
    };
    ( $radio:expr, $synth:expr ) => {
        $crate::timer::global_rx_driver_setup(&RX_DRIVER, $radio, $synth)
    };
}

/// Services one RF event on the global `RX_DRIVER`, posting a finished frame
/// to `$mailbox`.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn RF() {
///     for event in RfEvent::from_rfif(RFIF.read()) {
///         rf_event!(MAILBOX, event);
///     }
/// }
/// ```
///
/// # Notes
/// - Safe to call before setup; it silently does nothing.
#[macro_export]
macro_rules! rf_event {
    ( $mailbox:expr, $event:expr ) => {
        $crate::timer::global_rf_event(&RX_DRIVER, &$mailbox, $event)
    };
}

#[cfg(test)]
mod tests {
    use crate::frame::{RfEvent, SessionState};
    use crate::mailbox::{FrameMailbox, OverwritePolicy};
    use crate::sim::SimRadio;
    use crate::timer::with_rx_driver;

    init_rx_driver!(SimRadio);

    #[test]
    fn test_macros_drive_global() {
        static MAILBOX: FrameMailbox = FrameMailbox::new(OverwritePolicy::Overwrite);
        assert_eq!(rf_event!(MAILBOX, RfEvent::Overflow), None);

        setup_rx_driver!(SimRadio::new());
        assert_eq!(with_rx_driver(&RX_DRIVER, |d| d.state()), Some(SessionState::Idle));
        assert_eq!(rf_event!(MAILBOX, RfEvent::FrameStart), None);
        assert_eq!(with_rx_driver(&RX_DRIVER, |d| d.state()), Some(SessionState::Idle));
    }
}
