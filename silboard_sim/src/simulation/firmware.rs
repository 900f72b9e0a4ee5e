// silboard_sim/src/simulation/firmware.rs

use tracing::{debug, info};

use silboard_core::actuators::{NUM_PWM_OUTPUTS, NUM_RC_CHANNELS};
use silboard_core::board::{Board, ImuSample};
use silboard_core::models::measurement::{AirspeedReading, BarometerReading};

// --- FIRMWARE TRAIT ---
/// Flight software running against a board. `init` is called once at boot,
/// `run` repeatedly from the tick loop.
pub trait Firmware: Send {
    fn init(&mut self, board: &mut dyn Board);
    fn run(&mut self, board: &mut dyn Board);
}

/// What the probe has observed so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeStats {
    /// Boot counter persisted in the board's non-volatile memory.
    pub boot_count: u32,
    pub imu_samples: u64,
    pub mag_reads: u64,
    pub baro_reads: u64,
    pub airspeed_reads: u64,
    pub sonar_reads: u64,
    pub rc_lost: bool,
    pub last_imu: Option<ImuSample>,
    pub last_mag: Option<[f32; 3]>,
    pub last_baro: Option<BarometerReading>,
    pub last_airspeed: Option<AirspeedReading>,
    pub last_sonar: Option<f32>,
}

/// A minimal firmware that exercises the whole board surface: it counts its
/// boots in non-volatile memory, samples the IMU whenever new data is ready,
/// polls the slower sensors at a fixed rate and passes RC input straight through
/// to the PWM outputs.
#[derive(Debug, Clone)]
pub struct ProbeFirmware {
    stats: ProbeStats,
    /// Period of the magnetometer/barometer/airspeed/sonar loop.
    slow_period_ms: u32,
    next_slow_ms: u32,
    has_airspeed: bool,
}

impl Default for ProbeFirmware {
    fn default() -> Self {
        Self::new(20)
    }
}

impl ProbeFirmware {
    pub fn new(slow_period_ms: u32) -> Self {
        Self {
            stats: ProbeStats::default(),
            slow_period_ms,
            next_slow_ms: 0,
            has_airspeed: false,
        }
    }

    pub fn stats(&self) -> &ProbeStats {
        &self.stats
    }

    fn load_boot_count(board: &mut dyn Board) -> u32 {
        let mut buf = [0u8; 4];
        if board.memory_read(&mut buf) {
            u32::from_le_bytes(buf)
        } else {
            0
        }
    }

    fn poll_slow_sensors(&mut self, board: &mut dyn Board) {
        if board.mag_check() {
            self.stats.last_mag = Some(board.mag_read());
            self.stats.mag_reads += 1;
        }
        if board.baro_check() {
            self.stats.last_baro = Some(board.baro_read());
            self.stats.baro_reads += 1;
        }
        if self.has_airspeed {
            self.stats.last_airspeed = Some(board.diff_pressure_read());
            self.stats.airspeed_reads += 1;
        }
        if board.sonar_check() {
            self.stats.last_sonar = Some(board.sonar_read());
            self.stats.sonar_reads += 1;
        }
        board.led0_toggle();
    }
}

impl Firmware for ProbeFirmware {
    fn init(&mut self, board: &mut dyn Board) {
        board.init_board();
        board.sensors_init();
        board.pwm_init(false, 490, 1000);
        board.memory_init();

        self.stats.boot_count = Self::load_boot_count(board).wrapping_add(1);
        if !board.memory_write(&self.stats.boot_count.to_le_bytes()) {
            debug!("Boot counter could not be persisted");
        }

        self.has_airspeed = board.diff_pressure_check();
        self.next_slow_ms = 0;
        board.led1_on();
        info!(
            "Probe firmware booted (boot #{}, airspeed sensor: {})",
            self.stats.boot_count, self.has_airspeed
        );
    }

    fn run(&mut self, board: &mut dyn Board) {
        // --- 1. IMU, at the board's sample rate ---
        if board.new_imu_data() {
            self.stats.last_imu = Some(board.imu_read());
            self.stats.imu_samples += 1;
        }

        // --- 2. Slow sensors ---
        let now_ms = board.clock_millis();
        if now_ms >= self.next_slow_ms {
            self.next_slow_ms = now_ms + self.slow_period_ms;
            self.poll_slow_sensors(board);
        }

        // --- 3. RC pass-through ---
        self.stats.rc_lost = board.pwm_lost();
        for channel in 0..NUM_RC_CHANNELS.min(NUM_PWM_OUTPUTS) {
            let value = board.pwm_read(channel);
            board.pwm_write(channel, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::physics::KinematicPhysics;
    use nalgebra::{Isometry3, Vector3};
    use silboard_core::abstractions::{Defaults, NoRc};
    use silboard_core::actuators::{PWM_CENTER, PWM_MIN, THROTTLE_CHANNEL};
    use silboard_core::board::SilBoard;
    use silboard_core::noise::NoiseEngine;
    use silboard_core::persistence::PersistentStore;
    use silboard_core::types::VehicleType;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn board(root: &Path, vehicle: VehicleType) -> (SilBoard, Arc<KinematicPhysics>) {
        let physics = Arc::new(KinematicPhysics::new(
            Isometry3::translation(0.0, 0.0, 2.0),
            Vector3::new(5.0, 0.0, 0.0),
            0.0,
            Vector3::new(0.0, 0.0, -9.81),
        ));
        let board = SilBoard::new(
            physics.clone(),
            &Defaults,
            Arc::new(NoRc),
            Box::new(NoiseEngine::seeded(3)),
            vehicle,
            PersistentStore::new(root, "probe"),
        );
        (board, physics)
    }

    #[test]
    fn boot_counter_survives_reboots() {
        let root = tempdir().unwrap();
        for expected in 1..=3 {
            let (mut board, _physics) = board(root.path(), VehicleType::Multirotor);
            let mut firmware = ProbeFirmware::default();
            firmware.init(&mut board);
            assert_eq!(firmware.stats().boot_count, expected);
        }
    }

    #[test]
    fn failsafe_rc_is_passed_through() {
        let root = tempdir().unwrap();
        let (mut board, _physics) = board(root.path(), VehicleType::Multirotor);
        let mut firmware = ProbeFirmware::default();
        firmware.init(&mut board);
        firmware.run(&mut board);

        let outputs = board.outputs();
        assert_eq!(outputs[0], PWM_CENTER);
        assert_eq!(outputs[THROTTLE_CHANNEL], PWM_MIN);
        assert_eq!(outputs[NUM_RC_CHANNELS], PWM_MIN);
        assert!(firmware.stats().rc_lost);
        assert!(!board.motors_spinning());
    }

    #[test]
    fn sensors_are_polled_at_their_rates() {
        let root = tempdir().unwrap();
        let (mut board, physics) = board(root.path(), VehicleType::Fixedwing);
        let mut firmware = ProbeFirmware::new(20);
        firmware.init(&mut board);

        // 100 ms at 1 kHz, two firmware passes per tick.
        for _ in 0..100 {
            firmware.run(&mut board);
            firmware.run(&mut board);
            physics.step(0.001);
        }

        let stats = firmware.stats();
        // Accumulated float time may truncate a microsecond short of a boundary,
        // which defers a sample to the next tick.
        // The first sample is due 1 ms after boot.
        assert!((90..=99).contains(&stats.imu_samples), "{} IMU samples", stats.imu_samples);
        assert_eq!(stats.baro_reads, 5);
        assert_eq!(stats.airspeed_reads, 5);
        assert_eq!(stats.sonar_reads, 5);
        assert!(stats.last_airspeed.unwrap().diff_pressure > 0.0);
    }

    #[test]
    fn multirotor_skips_airspeed() {
        let root = tempdir().unwrap();
        let (mut board, _physics) = board(root.path(), VehicleType::Multirotor);
        let mut firmware = ProbeFirmware::default();
        firmware.init(&mut board);
        firmware.run(&mut board);
        assert_eq!(firmware.stats().airspeed_reads, 0);
        assert_eq!(firmware.stats().mag_reads, 1);
    }
}
