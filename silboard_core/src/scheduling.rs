// silboard_core/src/scheduling.rs

/// Gates a high-rate sensor to its configured sample period, however often the
/// firmware polls. Emulates a data-ready interrupt with a software deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleScheduler {
    next_update_time_us: u64,
    period_us: u64,
}

impl SampleScheduler {
    /// A scheduler for `rate_hz`. The first sample is due one period after boot.
    pub fn from_rate_hz(rate_hz: f64) -> Self {
        Self::from_period_us((1e6 / rate_hz) as u64)
    }

    pub fn from_period_us(period_us: u64) -> Self {
        Self {
            next_update_time_us: period_us,
            period_us,
        }
    }

    /// Returns true when a new sample is due at `now_us`.
    ///
    /// The next deadline is measured from `now_us`, not from the missed
    /// boundary, so a stalled loop produces exactly one sample and no burst.
    pub fn poll(&mut self, now_us: u64) -> bool {
        if now_us >= self.next_update_time_us {
            self.next_update_time_us = now_us + self.period_us;
            true
        } else {
            false
        }
    }

    /// Re-arms the scheduler for a fresh boot: the next sample is due one
    /// period after time zero.
    pub fn reset(&mut self) {
        self.next_update_time_us = self.period_us;
    }

    pub fn next_update_time_us(&self) -> u64 {
        self.next_update_time_us
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }
}
