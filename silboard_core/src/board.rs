// silboard_core/src/board.rs

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::abstractions::{NoiseSource, ParameterSource, PhysicsStateProvider, RcSource};
use crate::actuators::{ActuatorIo, NUM_PWM_OUTPUTS};
use crate::clock::SimClock;
use crate::config::SensorConfig;
use crate::models::measurement::{
    AirspeedModel, AirspeedReading, BarometerModel, BarometerReading, ImuModel, ImuReading,
    MagnetometerModel, SampleContext, SimulatedSensor, SonarModel,
};
use crate::persistence::PersistentStore;
use crate::scheduling::SampleScheduler;
use crate::types::{GroundTruthState, Vec3, VehicleType};

/// One IMU sample together with the board time it was taken at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    pub reading: ImuReading,
    /// Microseconds since boot.
    pub time_us: u64,
}

// =========================================================================
// == Board Contract ==
// =========================================================================

/// The hardware abstraction the flight firmware is written against.
///
/// Every call is non-blocking apart from the memory operations, and none of them
/// can abort: failures come back as `false`.
pub trait Board {
    // --- Lifecycle ---
    fn init_board(&mut self);
    fn board_reset(&mut self, bootloader: bool);
    fn sensors_init(&mut self);
    fn num_sensor_errors(&self) -> u16;

    // --- Clock ---
    fn clock_millis(&self) -> u32;
    fn clock_micros(&self) -> u64;
    fn clock_delay(&self, milliseconds: u32);

    // --- IMU ---
    /// True once per IMU sample period.
    fn new_imu_data(&mut self) -> bool;
    /// The simulated IMU never fails, so a read always yields a sample.
    fn imu_read(&mut self) -> ImuSample;
    fn imu_not_responding_error(&mut self);

    // --- Magnetometer ---
    fn mag_check(&mut self) -> bool;
    fn mag_read(&mut self) -> [f32; 3];

    // --- Barometer ---
    fn baro_check(&mut self) -> bool;
    fn baro_read(&mut self) -> BarometerReading;

    // --- Differential pressure ---
    fn diff_pressure_check(&mut self) -> bool;
    fn diff_pressure_read(&mut self) -> AirspeedReading;

    // --- Sonar ---
    fn sonar_check(&mut self) -> bool;
    fn sonar_read(&mut self) -> f32;

    // --- PWM ---
    fn pwm_init(&mut self, cppm: bool, refresh_rate: u32, idle_pwm: u16);
    fn pwm_read(&mut self, channel: usize) -> u16;
    fn pwm_write(&mut self, channel: usize, value: u16);
    fn pwm_lost(&mut self) -> bool;

    // --- Non-volatile memory ---
    fn memory_init(&mut self);
    fn memory_read(&mut self, dest: &mut [u8]) -> bool;
    fn memory_write(&mut self, src: &[u8]) -> bool;

    // --- LEDs ---
    fn led0_on(&mut self) {}
    fn led0_off(&mut self) {}
    fn led0_toggle(&mut self) {}
    fn led1_on(&mut self) {}
    fn led1_off(&mut self) {}
    fn led1_toggle(&mut self) {}
}

// =========================================================================
// == Simulated Board ==
// =========================================================================

/// A flight-controller board whose sensors are synthesized from simulation
/// ground truth and whose outputs are captured for an external dynamics model.
pub struct SilBoard {
    physics: Arc<dyn PhysicsStateProvider>,
    rc: Arc<dyn RcSource>,
    noise: Box<dyn NoiseSource>,

    config: SensorConfig,
    vehicle: VehicleType,
    /// Captured once at setup from the physics provider.
    gravity: Vec3,

    clock: SimClock,
    imu_schedule: SampleScheduler,
    actuators: ActuatorIo,
    store: PersistentStore,

    imu: ImuModel,
    mag: MagnetometerModel,
    baro: BarometerModel,
    airspeed: AirspeedModel,
    sonar: SonarModel,
}

impl SilBoard {
    /// Resolves the sensor configuration, draws every initial bias and arms the
    /// IMU schedule so the first poll fires.
    pub fn new(
        physics: Arc<dyn PhysicsStateProvider>,
        params: &dyn ParameterSource,
        rc: Arc<dyn RcSource>,
        mut noise: Box<dyn NoiseSource>,
        vehicle: VehicleType,
        store: PersistentStore,
    ) -> Self {
        let config = SensorConfig::load(params);
        let gravity = physics.snapshot().gravity;

        let mut imu = ImuModel::new(&config);
        let mut mag = MagnetometerModel::new(&config);
        let mut baro = BarometerModel::new(&config);
        let mut airspeed = AirspeedModel::new(&config);
        let sonar = SonarModel::new(&config);

        imu.initialize(noise.as_mut());
        mag.initialize(noise.as_mut());
        baro.initialize(noise.as_mut());
        airspeed.initialize(noise.as_mut());

        info!(
            "Board ready: {} with IMU at {} Hz, memory at {}",
            vehicle,
            config.imu_update_rate,
            store.path().display()
        );

        Self {
            physics,
            rc,
            noise,
            imu_schedule: SampleScheduler::from_period_us(config.imu_update_period_us()),
            config,
            vehicle,
            gravity,
            clock: SimClock::default(),
            actuators: ActuatorIo::new(),
            store,
            imu,
            mag,
            baro,
            airspeed,
            sonar,
        }
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    pub fn vehicle(&self) -> VehicleType {
        self.vehicle
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Last commanded PWM values, for the dynamics model.
    pub fn outputs(&self) -> [u16; NUM_PWM_OUTPUTS] {
        self.actuators.outputs()
    }

    pub fn motors_spinning(&self) -> bool {
        self.actuators.motors_spinning()
    }

    pub fn imu(&self) -> &ImuModel {
        &self.imu
    }

    pub fn magnetometer(&self) -> &MagnetometerModel {
        &self.mag
    }

    fn context(&self) -> SampleContext {
        SampleContext {
            motors_spinning: self.actuators.motors_spinning(),
        }
    }

    /// Ground truth with the gravity captured at setup.
    fn truth(&self) -> GroundTruthState {
        let mut truth = self.physics.snapshot();
        truth.gravity = self.gravity;
        truth
    }

    fn sim_time(&self) -> f64 {
        self.physics.sim_time()
    }
}

impl fmt::Debug for SilBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SilBoard")
            .field("vehicle", &self.vehicle)
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("imu_schedule", &self.imu_schedule)
            .field("actuators", &self.actuators)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Board for SilBoard {
    fn init_board(&mut self) {
        self.clock.boot(self.sim_time());
        self.imu_schedule.reset();
        debug!("Board booted at sim time {:.6} s", self.clock.boot_time());
    }

    fn board_reset(&mut self, bootloader: bool) {
        debug!("Ignoring board reset request (bootloader: {})", bootloader);
    }

    fn sensors_init(&mut self) {
        self.imu.initialize(self.noise.as_mut());
        self.mag
            .set_inertial_field(self.config.inertial_magnetic_field());
    }

    fn num_sensor_errors(&self) -> u16 {
        0
    }

    fn clock_millis(&self) -> u32 {
        self.clock.millis(self.sim_time())
    }

    fn clock_micros(&self) -> u64 {
        self.clock.micros(self.sim_time())
    }

    fn clock_delay(&self, milliseconds: u32) {
        self.clock.delay(milliseconds);
    }

    fn new_imu_data(&mut self) -> bool {
        let now_us = self.clock_micros();
        self.imu_schedule.poll(now_us)
    }

    fn imu_read(&mut self) -> ImuSample {
        let truth = self.truth();
        let context = self.context();
        let reading = self.imu.sample(&truth, context, self.noise.as_mut());
        ImuSample {
            reading,
            time_us: self.clock_micros(),
        }
    }

    fn imu_not_responding_error(&mut self) {
        error!("IMU not responding");
    }

    fn mag_check(&mut self) -> bool {
        true
    }

    fn mag_read(&mut self) -> [f32; 3] {
        let truth = self.truth();
        let context = self.context();
        self.mag.sample(&truth, context, self.noise.as_mut())
    }

    fn baro_check(&mut self) -> bool {
        true
    }

    fn baro_read(&mut self) -> BarometerReading {
        let truth = self.truth();
        let context = self.context();
        self.baro.sample(&truth, context, self.noise.as_mut())
    }

    fn diff_pressure_check(&mut self) -> bool {
        self.vehicle.has_airspeed_sensor()
    }

    fn diff_pressure_read(&mut self) -> AirspeedReading {
        let truth = self.truth();
        let context = self.context();
        self.airspeed.sample(&truth, context, self.noise.as_mut())
    }

    fn sonar_check(&mut self) -> bool {
        true
    }

    fn sonar_read(&mut self) -> f32 {
        let truth = self.truth();
        let context = self.context();
        self.sonar.sample(&truth, context, self.noise.as_mut())
    }

    fn pwm_init(&mut self, cppm: bool, refresh_rate: u32, idle_pwm: u16) {
        debug!(
            "PWM init (cppm: {}, refresh rate: {} Hz, idle: {})",
            cppm, refresh_rate, idle_pwm
        );
        self.actuators.init(Arc::clone(&self.rc));
    }

    fn pwm_read(&mut self, channel: usize) -> u16 {
        self.actuators.read(channel)
    }

    fn pwm_write(&mut self, channel: usize, value: u16) {
        self.actuators.write(channel, value);
    }

    fn pwm_lost(&mut self) -> bool {
        self.actuators.lost()
    }

    fn memory_init(&mut self) {}

    fn memory_read(&mut self, dest: &mut [u8]) -> bool {
        match self.store.read(dest) {
            Ok(_) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    fn memory_write(&mut self, src: &[u8]) -> bool {
        match self.store.write(src) {
            Ok(()) => true,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstractions::{Defaults, NoRc};
    use crate::actuators::{RcFrame, RcInbox, PWM_CENTER, PWM_MIN, THROTTLE_CHANNEL};
    use crate::noise::NoiseEngine;
    use approx::assert_abs_diff_eq;
    use nalgebra::Vector3;
    use parking_lot::{Mutex, RwLock};
    use std::collections::HashMap;
    use tempfile::{tempdir, TempDir};

    /// A physics provider whose state the test sets directly.
    #[derive(Debug)]
    struct ManualPhysics {
        state: RwLock<GroundTruthState>,
    }

    impl ManualPhysics {
        fn new(state: GroundTruthState) -> Arc<Self> {
            Arc::new(Self {
                state: RwLock::new(state),
            })
        }

        fn set_time(&self, t: f64) {
            self.state.write().timestamp = t;
        }

        fn set_altitude(&self, alt: f64) {
            self.state.write().position.z = alt;
        }
    }

    impl PhysicsStateProvider for ManualPhysics {
        fn snapshot(&self) -> GroundTruthState {
            self.state.read().clone()
        }
    }

    /// Always connected; the test pushes frames through the inbox it kept.
    #[derive(Debug, Default)]
    struct LiveRc {
        inbox: Mutex<Option<RcInbox>>,
    }

    impl RcSource for LiveRc {
        fn connected(&self) -> bool {
            true
        }

        fn subscribe(&self, inbox: RcInbox) {
            *self.inbox.lock() = Some(inbox);
        }
    }

    fn quiet_params() -> HashMap<String, f64> {
        [
            "gyro_bias_range",
            "acc_bias_range",
            "mag_bias_range",
            "baro_bias_range",
            "airspeed_bias_range",
            "gyro_bias_walk_stdev",
            "acc_bias_walk_stdev",
            "mag_bias_walk_stdev",
            "baro_bias_walk_stdev",
            "airspeed_bias_walk_stdev",
            "mag_stdev",
            "baro_stdev",
            "airspeed_stdev",
            "sonar_stdev",
        ]
        .into_iter()
        .map(|key| (key.to_string(), 0.0))
        .collect()
    }

    fn board_with(
        physics: Arc<ManualPhysics>,
        params: &dyn ParameterSource,
        vehicle: VehicleType,
    ) -> (SilBoard, TempDir) {
        let root = tempdir().unwrap();
        let board = SilBoard::new(
            physics,
            params,
            Arc::new(NoRc),
            Box::new(NoiseEngine::seeded(42)),
            vehicle,
            PersistentStore::new(root.path(), "test"),
        );
        (board, root)
    }

    #[test]
    fn imu_gating_follows_sample_period() {
        let physics = ManualPhysics::new(GroundTruthState::default());
        let (mut board, _root) = board_with(physics.clone(), &Defaults, VehicleType::Multirotor);
        board.init_board();

        let mut fired = Vec::new();
        for t_us in [0u64, 500, 999, 1000, 1500, 1999, 2000] {
            physics.set_time(t_us as f64 / 1e6);
            fired.push(board.new_imu_data());
        }
        assert_eq!(fired, [false, false, false, true, false, false, true]);
    }

    #[test]
    fn reboot_rearms_imu_schedule() {
        let physics = ManualPhysics::new(GroundTruthState::default());
        let (mut board, _root) = board_with(physics.clone(), &Defaults, VehicleType::Multirotor);
        board.init_board();

        physics.set_time(0.005);
        assert!(board.new_imu_data());

        // Rebooting at 5 ms puts board time back to zero.
        board.init_board();
        assert_eq!(board.clock_micros(), 0);
        assert!(!board.new_imu_data());
        physics.set_time(0.0055);
        assert!(!board.new_imu_data());
        physics.set_time(0.0065);
        assert!(board.new_imu_data());
    }

    #[test]
    fn clock_counts_from_init_board() {
        let physics = ManualPhysics::new(GroundTruthState {
            timestamp: 10.0,
            ..GroundTruthState::default()
        });
        let (mut board, _root) = board_with(physics.clone(), &Defaults, VehicleType::Multirotor);
        board.init_board();
        assert_eq!(board.clock_micros(), 0);

        physics.set_time(10.25);
        assert_eq!(board.clock_millis(), 250);
        assert_eq!(board.clock_micros(), 250_000);

        let sample = board.imu_read();
        assert_eq!(sample.time_us, 250_000);
    }

    #[test]
    fn quiet_board_at_rest_reads_truth() {
        let physics = ManualPhysics::new(GroundTruthState::default());
        let mut params = quiet_params();
        params.insert("ground_altitude".to_string(), 0.0);
        let (mut board, _root) = board_with(physics.clone(), &params, VehicleType::Multirotor);
        board.init_board();
        board.pwm_init(false, 490, 1000);

        // Motors idle, so no inertial noise either.
        let imu = board.imu_read().reading;
        assert_abs_diff_eq!(imu.accel[0], 0.0);
        assert_abs_diff_eq!(imu.accel[1], 0.0);
        assert_abs_diff_eq!(imu.accel[2], -9.81, epsilon = 1e-5);
        assert_eq!(imu.gyro, [0.0; 3]);
        assert_eq!(imu.temperature, 27.0);

        let baro = board.baro_read();
        assert_abs_diff_eq!(baro.pressure, 101_325.0, epsilon = 1e-2);

        physics.set_altitude(3.0);
        assert_abs_diff_eq!(board.sonar_read(), 3.0);
        physics.set_altitude(0.0);
        assert_eq!(board.sonar_read(), 0.25);

        let mag = board.mag_read();
        let norm = mag.iter().map(|v| (*v as f64).powi(2)).sum::<f64>().sqrt();
        assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn airspeed_presence_depends_on_vehicle() {
        let physics = ManualPhysics::new(GroundTruthState::default());
        let (mut fixedwing, _a) = board_with(physics.clone(), &Defaults, VehicleType::Fixedwing);
        let (mut multirotor, _b) = board_with(physics, &Defaults, VehicleType::Multirotor);

        assert!(fixedwing.diff_pressure_check());
        assert!(!multirotor.diff_pressure_check());
        for board in [&mut fixedwing, &mut multirotor] {
            assert!(board.mag_check());
            assert!(board.baro_check());
            assert!(board.sonar_check());
            // Reported, but the simulated sensors never count as failed.
            board.imu_not_responding_error();
            assert_eq!(board.num_sensor_errors(), 0);
        }
    }

    #[test]
    fn throttle_write_gates_inertial_noise() {
        let physics = ManualPhysics::new(GroundTruthState::default());
        let params = quiet_params();
        let (mut board, _root) = board_with(physics, &params, VehicleType::Multirotor);
        board.init_board();
        board.pwm_init(false, 490, 1000);

        assert!(!board.motors_spinning());
        let idle = board.imu_read().reading;
        assert_eq!(idle.gyro, [0.0; 3]);

        board.pwm_write(THROTTLE_CHANNEL, 1500);
        assert!(board.motors_spinning());
        assert_eq!(board.outputs()[THROTTLE_CHANNEL], 1500);
        let spinning = board.imu_read().reading;
        assert_ne!(spinning.gyro, [0.0; 3]);
    }

    #[test]
    fn pwm_reads_failsafe_then_live_rc() {
        let physics = ManualPhysics::new(GroundTruthState::default());
        let root = tempdir().unwrap();
        let rc = Arc::new(LiveRc::default());
        let mut board = SilBoard::new(
            physics,
            &Defaults,
            rc.clone(),
            Box::new(NoiseEngine::seeded(1)),
            VehicleType::Multirotor,
            PersistentStore::new(root.path(), "rc"),
        );
        board.pwm_init(false, 50, 1000);
        assert!(board.pwm_lost());
        assert_eq!(board.pwm_read(0), PWM_CENTER);
        assert_eq!(board.pwm_read(THROTTLE_CHANNEL), PWM_MIN);

        let inbox = rc.inbox.lock().clone().unwrap();
        inbox.deliver(RcFrame::from_slice(&[1600, 1400, 1300, 1500]));
        assert!(!board.pwm_lost());
        assert_eq!(board.pwm_read(0), 1600);
        assert_eq!(board.pwm_read(THROTTLE_CHANNEL), 1300);
    }

    #[test]
    fn memory_round_trips_through_board() {
        let physics = ManualPhysics::new(GroundTruthState::default());
        let (mut board, _root) = board_with(physics, &Defaults, VehicleType::Fixedwing);
        board.memory_init();

        let mut buf = [0u8; 3];
        assert!(!board.memory_read(&mut buf));
        assert_eq!(buf, [0; 3]);

        assert!(board.memory_write(&[0x01, 0x02, 0x03]));
        assert!(board.memory_read(&mut buf));
        assert_eq!(buf, [0x01, 0x02, 0x03]);
    }

    #[test]
    fn sensors_init_redraws_imu_biases_and_restores_field() {
        let physics = ManualPhysics::new(GroundTruthState::default());
        let (mut board, _root) = board_with(physics, &Defaults, VehicleType::Multirotor);
        let before = board.imu().gyro_bias();

        board.mag.set_inertial_field(Vector3::x());
        board.sensors_init();

        assert_ne!(board.imu().gyro_bias(), before);
        assert_eq!(
            board.magnetometer().inertial_field(),
            board.config().inertial_magnetic_field()
        );
    }
}
