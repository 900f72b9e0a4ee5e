// silboard_core/src/clock.rs

/// A time base derived from simulation time, never from the wall clock.
/// Pausing or fast-forwarding the simulation is therefore transparent to the firmware.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimClock {
    boot_time: f64,
}

impl SimClock {
    /// Records `sim_time` (seconds) as the zero reference.
    pub fn boot(&mut self, sim_time: f64) {
        self.boot_time = sim_time;
    }

    pub fn boot_time(&self) -> f64 {
        self.boot_time
    }

    /// Milliseconds since boot, truncated.
    pub fn millis(&self, sim_time: f64) -> u32 {
        ((sim_time - self.boot_time) * 1e3) as u32
    }

    /// Microseconds since boot, truncated.
    pub fn micros(&self, sim_time: f64) -> u64 {
        ((sim_time - self.boot_time) * 1e6) as u64
    }

    /// The simulation advances by external stepping; there is nothing to wait for.
    pub fn delay(&self, _milliseconds: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_from_boot_time() {
        let mut clock = SimClock::default();
        clock.boot(12.5);
        assert_eq!(clock.millis(12.5), 0);
        assert_eq!(clock.micros(12.5), 0);
        assert_eq!(clock.millis(13.75), 1_250);
        assert_eq!(clock.micros(13.75), 1_250_000);
    }

    #[test]
    fn truncates_instead_of_rounding() {
        let clock = SimClock::default();
        assert_eq!(clock.millis(0.0019), 1);
        assert_eq!(clock.micros(0.0000019), 1);
    }

    #[test]
    fn monotonic_for_monotonic_sim_time() {
        let mut clock = SimClock::default();
        clock.boot(3.0);
        let mut last = 0;
        for step in 0..10_000 {
            let now = clock.micros(3.0 + step as f64 * 0.000_37);
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn time_before_boot_saturates_at_zero() {
        let mut clock = SimClock::default();
        clock.boot(5.0);
        assert_eq!(clock.micros(4.0), 0);
        assert_eq!(clock.millis(4.0), 0);
    }
}
