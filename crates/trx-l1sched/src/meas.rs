use trx_core::FrameNumber;

use crate::SchedError;

/// Number of measurements kept per logical channel
pub const MEAS_HIST_SIZE: usize = 8;

/// Burst measurement as reported by the transceiver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Measurement {
    pub frame: FrameNumber,
    /// Time of arrival in 1/256 symbol periods
    pub toa256: i16,
    /// Received signal level in dBm
    pub rssi: i8,
}

/// Circular measurement history, oldest entries are overwritten
#[derive(Debug, Clone, Default)]
pub struct MeasHistory {
    buf: [Measurement; MEAS_HIST_SIZE],
    /// Slot the next measurement goes into
    head: usize,
    len: usize,
}

impl MeasHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, meas: Measurement) {
        self.buf[self.head] = meas;
        self.head = (self.head + 1) % MEAS_HIST_SIZE;
        self.len = (self.len + 1).min(MEAS_HIST_SIZE);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn latest(&self) -> Option<&Measurement> {
        if self.len == 0 {
            return None;
        }
        Some(&self.buf[(self.head + MEAS_HIST_SIZE - 1) % MEAS_HIST_SIZE])
    }

    /// Averages the `n` most recent measurements. The returned frame number is
    /// the one of the oldest measurement in the window.
    pub fn average(&self, n: usize) -> Result<Measurement, SchedError> {
        if n == 0 || n > MEAS_HIST_SIZE {
            return Err(SchedError::InvalidHistoryWindow(n));
        }
        if n > self.len {
            return Err(SchedError::InsufficientHistory { requested: n, available: self.len });
        }

        let mut toa_sum: i32 = 0;
        let mut rssi_sum: i32 = 0;
        let mut oldest = self.buf[0].frame;

        // Walk backwards from the most recent entry
        for i in 1..=n {
            let m = &self.buf[(self.head + MEAS_HIST_SIZE - i) % MEAS_HIST_SIZE];
            toa_sum += m.toa256 as i32;
            rssi_sum += m.rssi as i32;
            oldest = m.frame;
        }

        Ok(Measurement {
            frame: oldest,
            toa256: (toa_sum / n as i32) as i16,
            rssi: (rssi_sum / n as i32) as i8,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meas(f: u32, toa256: i16, rssi: i8) -> Measurement {
        Measurement { frame: FrameNumber::new(f), toa256, rssi }
    }

    #[test]
    fn test_average_single_is_latest() {
        let mut hist = MeasHistory::new();
        hist.push(meas(10, 100, -60));
        hist.push(meas(11, -37, -71));
        assert_eq!(hist.average(1).unwrap(), meas(11, -37, -71));
        assert_eq!(hist.latest(), Some(&meas(11, -37, -71)));
    }

    #[test]
    fn test_average_full_history() {
        let mut hist = MeasHistory::new();
        // Twelve pushes, only the last eight (frames 4..=11) remain
        for f in 0..12u32 {
            hist.push(meas(f, f as i16 * 8, -(f as i8) * 2 - 50));
        }
        assert_eq!(hist.len(), MEAS_HIST_SIZE);

        let avg = hist.average(MEAS_HIST_SIZE).unwrap();
        let toa: i32 = (4..12).map(|f| f * 8).sum::<i32>() / 8;
        let rssi: i32 = (4..12).map(|f| -f * 2 - 50).sum::<i32>() / 8;
        assert_eq!(avg, meas(4, toa as i16, rssi as i8));
    }

    #[test]
    fn test_average_errors() {
        let mut hist = MeasHistory::new();
        assert_eq!(hist.average(0), Err(SchedError::InvalidHistoryWindow(0)));
        assert_eq!(hist.average(9), Err(SchedError::InvalidHistoryWindow(9)));
        assert_eq!(
            hist.average(1),
            Err(SchedError::InsufficientHistory { requested: 1, available: 0 })
        );
        hist.push(meas(0, 0, -80));
        hist.push(meas(1, 0, -80));
        assert!(hist.average(2).is_ok());
        assert!(hist.average(3).is_err());
        hist.clear();
        assert!(hist.is_empty());
    }
}
