//! Per-channel calibration storage and RSSI sweeps.
//!
//! Calibrating a channel is slow (a synthesizer calibration plus settling
//! time). [`ChannelTable`] remembers the resulting frequency and calibration
//! bytes for each channel so it can later be revisited by rewriting registers
//! only, and keeps a running current/maximum RSSI per channel.

use embedded_hal::delay::DelayNs;

use crate::consts::CAL_SETTLE_MS;
use crate::encoding::normalize_rssi;
use crate::error::RadioError;
use crate::radio::{CalWords, FreqWords, RadioControl, Strobe};
use crate::synth::Synthesizer;
use crate::timer::dwell;

/// Calibration and signal-strength record for one channel.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct ChannelEntry {
    /// Carrier frequency in Hz; zero until the channel is calibrated.
    pub freq_hz: u32,
    /// Synthesizer frequency bytes captured at calibration.
    pub freq: FreqWords,
    /// Synthesizer calibration bytes captured at calibration.
    pub cal: CalWords,
    /// Most recent normalized RSSI sample.
    pub current: u8,
    /// Largest normalized RSSI sample since the last reset.
    pub max: u8,
}

impl ChannelEntry {
    /// Whether the channel has been calibrated.
    pub fn is_calibrated(&self) -> bool {
        self.freq_hz != 0
    }

    /// Stores a new normalized RSSI sample.
    ///
    /// `current` is always overwritten; `max` never decreases.
    pub fn record(&mut self, sample: u8) {
        self.current = sample;
        self.max = self.max.max(sample);
    }

    /// Forgets the signal-strength history.
    pub fn reset_stats(&mut self) {
        self.current = 0;
        self.max = 0;
    }
}

/// Fixed-size table of channels, one entry per index.
#[derive(Debug)]
pub struct ChannelTable<const N: usize> {
    entries: [ChannelEntry; N],
}

impl<const N: usize> Default for ChannelTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ChannelTable<N> {
    /// Creates a table of `N` uncalibrated channels.
    pub const fn new() -> Self {
        const EMPTY: ChannelEntry = ChannelEntry {
            freq_hz: 0,
            freq: FreqWords {
                freq2: 0,
                freq1: 0,
                freq0: 0,
            },
            cal: CalWords {
                fscal3: 0,
                fscal2: 0,
                fscal1: 0,
            },
            current: 0,
            max: 0,
        };
        Self {
            entries: [EMPTY; N],
        }
    }

    /// Number of channels.
    pub const fn len(&self) -> usize {
        N
    }

    /// Whether the table has no channels.
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// The entry at `ch`, if any.
    pub fn get(&self, ch: usize) -> Option<&ChannelEntry> {
        self.entries.get(ch)
    }

    /// All entries in index order.
    pub fn entries(&self) -> &[ChannelEntry] {
        &self.entries
    }

    fn entry_mut(&mut self, ch: usize) -> Result<&mut ChannelEntry, RadioError> {
        self.entries.get_mut(ch).ok_or(RadioError::NoSuchChannel(ch))
    }

    /// Forgets the signal-strength history of channel `ch`.
    pub fn reset_stats(&mut self, ch: usize) -> Result<(), RadioError> {
        self.entry_mut(ch)?.reset_stats();
        Ok(())
    }

    /// Calibrates channel `ch` at `hz` and stores the result.
    ///
    /// Programs the frequency, strobes a calibration and then RX (which also
    /// calibrates when coming out of IDLE), waits a fixed settling time,
    /// snapshots the frequency and calibration bytes, takes an initial RSSI
    /// sample and resets `max`. The radio is left in IDLE.
    ///
    /// The settling wait is a fixed delay, not a confirmed state change.
    ///
    /// # Returns
    /// `hz` unchanged on success.
    pub fn calibrate<R, D>(
        &mut self,
        radio: &mut R,
        synth: &Synthesizer,
        delay: &mut D,
        hz: u32,
        ch: usize,
    ) -> Result<u32, RadioError>
    where
        R: RadioControl,
        D: DelayNs,
    {
        let entry = self.entry_mut(ch)?;
        let _ = synth.program(radio, hz)?;

        radio.strobe(Strobe::Calibrate);
        radio.strobe(Strobe::Rx);
        delay.delay_ms(CAL_SETTLE_MS);

        entry.freq_hz = hz;
        entry.freq = radio.freq_words();
        entry.cal = radio.cal_words();
        entry.current = normalize_rssi(radio.rssi());
        entry.max = 0;

        radio.strobe(Strobe::Idle);
        debug!("calibrated channel {} at {} Hz", ch, hz);
        Ok(hz)
    }

    /// Retunes to channel `ch` from stored bytes, without recalibrating.
    pub fn tune<R: RadioControl>(&self, radio: &mut R, ch: usize) -> Result<(), RadioError> {
        let entry = self.entries.get(ch).ok_or(RadioError::NoSuchChannel(ch))?;
        radio.write_freq_words(entry.freq);
        radio.write_cal_words(entry.cal);
        Ok(())
    }

    /// Samples every channel once, in index order.
    ///
    /// For each channel: restore its stored tuning (if calibrated), strobe RX,
    /// hold for `dwell_spins` busy iterations, sample RSSI into the entry,
    /// strobe IDLE, then hand the entry to `on_sample`.
    pub fn sweep<R, F>(&mut self, radio: &mut R, dwell_spins: u16, mut on_sample: F)
    where
        R: RadioControl,
        F: FnMut(usize, &ChannelEntry),
    {
        for (ch, entry) in self.entries.iter_mut().enumerate() {
            if entry.is_calibrated() {
                radio.write_freq_words(entry.freq);
                radio.write_cal_words(entry.cal);
            }
            radio.strobe(Strobe::Rx);
            dwell(dwell_spins);
            entry.record(normalize_rssi(radio.rssi()));
            radio.strobe(Strobe::Idle);
            on_sample(ch, entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::MarcState;
    use crate::sim::SimRadio;
    use embedded_hal_mock::eh1::delay::NoopDelay;

    fn raw(normalized: &[u8]) -> [u8; 4] {
        let mut out = [0; 4];
        for (o, &n) in out.iter_mut().zip(normalized) {
            *o = normalize_rssi(n);
        }
        out
    }

    #[test]
    fn test_record_keeps_running_max() {
        let mut entry = ChannelEntry::default();
        let mut last_max = 0;
        for sample in [40, 55, 30, 55] {
            entry.record(sample);
            assert!(entry.max >= last_max);
            last_max = entry.max;
        }
        assert_eq!(entry.current, 55);
        assert_eq!(entry.max, 55);
    }

    #[test]
    fn test_calibrate_snapshots_registers() {
        let synth = Synthesizer::default();
        let mut radio = SimRadio::new();
        let mut delay = NoopDelay::new();
        let mut table: ChannelTable<2> = ChannelTable::new();
        let _ = radio.queue_rssi(&[normalize_rssi(42)]);

        assert_eq!(
            table.calibrate(&mut radio, &synth, &mut delay, 902_382_395, 1),
            Ok(902_382_395)
        );

        let entry = table.get(1).unwrap();
        assert!(entry.is_calibrated());
        assert_eq!(entry.freq, FreqWords::from_word(0x21_6bec));
        assert_eq!(entry.cal, radio.cal_words());
        assert_eq!(entry.current, 42);
        assert_eq!(entry.max, 0);
        assert!(!table.get(0).unwrap().is_calibrated());
        assert_eq!(radio.strobes(), &[Strobe::Calibrate, Strobe::Rx, Strobe::Idle]);
        assert_eq!(radio.state(), MarcState::Idle);
    }

    #[test]
    fn test_calibrate_rejects_bad_channel() {
        let synth = Synthesizer::default();
        let mut radio = SimRadio::new();
        let mut delay = NoopDelay::new();
        let mut table: ChannelTable<1> = ChannelTable::new();
        assert_eq!(
            table.calibrate(&mut radio, &synth, &mut delay, 902_382_395, 1),
            Err(RadioError::NoSuchChannel(1))
        );
        assert!(radio.strobes().is_empty());
    }

    #[test]
    fn test_tune_restores_stored_words() {
        let synth = Synthesizer::default();
        let mut radio = SimRadio::new();
        let mut delay = NoopDelay::new();
        let mut table: ChannelTable<2> = ChannelTable::new();
        let _ = table.calibrate(&mut radio, &synth, &mut delay, 902_000_000, 0);
        let _ = table.calibrate(&mut radio, &synth, &mut delay, 915_000_000, 1);
        let first = *table.get(0).unwrap();

        table.tune(&mut radio, 0).unwrap();

        assert_eq!(radio.freq_words(), first.freq);
        assert_eq!(radio.cal_words(), first.cal);
        assert_eq!(table.tune(&mut radio, 5), Err(RadioError::NoSuchChannel(5)));
    }

    #[test]
    fn test_sweep_max_is_monotonic() {
        let mut radio = SimRadio::new();
        let mut table: ChannelTable<1> = ChannelTable::new();
        let _ = radio.queue_rssi(&raw(&[40, 55, 30, 55]));

        let mut maxima = [0u8; 4];
        for m in maxima.iter_mut() {
            table.sweep(&mut radio, 0, |_, e| *m = e.max);
        }

        assert_eq!(maxima, [40, 55, 55, 55]);
        let entry = table.get(0).unwrap();
        assert_eq!(entry.current, 55);
        assert_eq!(entry.max, 55);
    }

    #[test]
    fn test_sweep_visits_every_channel_in_order() {
        let mut radio = SimRadio::new();
        let mut table: ChannelTable<3> = ChannelTable::new();
        let _ = radio.queue_rssi(&[normalize_rssi(10), normalize_rssi(20), normalize_rssi(30)]);

        let mut seen = [(usize::MAX, 0u8); 3];
        let mut n = 0;
        table.sweep(&mut radio, 0, |ch, e| {
            seen[n] = (ch, e.current);
            n += 1;
        });

        assert_eq!(seen, [(0, 10), (1, 20), (2, 30)]);
        assert_eq!(
            radio.strobes(),
            &[
                Strobe::Rx,
                Strobe::Idle,
                Strobe::Rx,
                Strobe::Idle,
                Strobe::Rx,
                Strobe::Idle
            ]
        );
    }

    #[test]
    fn test_reset_stats() {
        let mut table: ChannelTable<1> = ChannelTable::new();
        let mut radio = SimRadio::new();
        let _ = radio.queue_rssi(&[normalize_rssi(70)]);
        table.sweep(&mut radio, 0, |_, _| {});
        table.reset_stats(0).unwrap();
        assert_eq!(table.get(0).unwrap().max, 0);
        assert_eq!(table.reset_stats(1), Err(RadioError::NoSuchChannel(1)));
    }
}
