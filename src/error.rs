//! Error types for the receive path.

use thiserror::Error;

use crate::radio::MarcState;

/// Errors reported by tuning, calibration and bounded state waits.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum RadioError {
    /// The radio did not reach the requested state within the poll budget.
    #[error("radio still in {last:?} after {ticks} polls waiting for {expected:?}")]
    StateTimeout {
        /// State that was waited for.
        expected: MarcState,
        /// Last state read back from the radio.
        last: MarcState,
        /// Number of polls spent before giving up.
        ticks: u16,
    },
    /// The requested carrier frequency lies outside the synthesizer band.
    #[error("frequency {0} Hz is outside the tuning band")]
    OutOfBand(u32),
    /// The calibration table has no entry at this index.
    #[error("no channel at index {0}")]
    NoSuchChannel(usize),
}

/// Outcome of a bounded state wait: the number of polls spent on success.
pub type WaitResult = Result<u16, RadioError>;
