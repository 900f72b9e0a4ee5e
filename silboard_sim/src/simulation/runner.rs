// silboard_sim/src/simulation/runner.rs

use crossbeam_channel::Sender;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use silboard_core::abstractions::PhysicsStateProvider;
use silboard_core::actuators::RcFrame;
use silboard_core::board::SilBoard;
use silboard_core::messages::Odometry;
use silboard_core::noise::NoiseEngine;
use silboard_core::persistence::PersistentStore;

use super::config::{ScenarioConfig, ScriptedRcFrame};
use super::error::SimError;
use super::firmware::{Firmware, ProbeFirmware};
use super::physics::KinematicPhysics;
use super::rc::ChannelRcSource;
use super::truth::{LogTruthSink, TruthSink};

/// Drives one board through a scenario, one physics tick at a time.
pub struct SimulationRunner<F: Firmware = ProbeFirmware> {
    board: SilBoard,
    firmware: F,
    physics: Arc<KinematicPhysics>,
    rc: Arc<ChannelRcSource>,
    rc_tx: Sender<RcFrame>,
    rc_script: Vec<ScriptedRcFrame>,
    next_rc_frame: usize,
    sink: Box<dyn TruthSink>,
    tick_period: f64,
    ticks: u64,
}

impl SimulationRunner<ProbeFirmware> {
    pub fn from_config(config: &ScenarioConfig) -> Result<Self, SimError> {
        Self::with_firmware(config, ProbeFirmware::default())
    }
}

impl<F: Firmware> SimulationRunner<F> {
    /// Builds every collaborator from `config`, assembles the board and boots `firmware` on it.
    pub fn with_firmware(config: &ScenarioConfig, mut firmware: F) -> Result<Self, SimError> {
        config.validate()?;
        let vehicle = config.vehicle_type()?;

        let physics = Arc::new(KinematicPhysics::from_config(&config.vehicle));
        let (rc, rc_tx) = ChannelRcSource::spawn(config.rc.connected)?;
        let rc = Arc::new(rc);

        let mut rc_script = config.rc.frames.clone();
        rc_script.sort_by(|a, b| a.time.total_cmp(&b.time));

        if config.simulation.seed.is_none() {
            warn!("No seed given; sensor noise will not be reproducible");
        }
        let noise = NoiseEngine::from_seed_or_entropy(config.simulation.seed);
        let store = PersistentStore::new(
            config.simulation.memory_root.clone(),
            &config.simulation.namespace,
        );

        let mut board = SilBoard::new(
            physics.clone(),
            &config.sensors,
            rc.clone(),
            Box::new(noise),
            vehicle,
            store,
        );
        firmware.init(&mut board);

        Ok(Self {
            board,
            firmware,
            physics,
            rc,
            rc_tx,
            rc_script,
            next_rc_frame: 0,
            sink: Box::new(LogTruthSink),
            tick_period: config.tick_period(),
            ticks: 0,
        })
    }

    /// Replaces the ground-truth sink.
    pub fn with_sink(mut self, sink: Box<dyn TruthSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn board(&self) -> &SilBoard {
        &self.board
    }

    pub fn firmware(&self) -> &F {
        &self.firmware
    }

    pub fn physics(&self) -> &KinematicPhysics {
        &self.physics
    }

    pub fn rc(&self) -> &ChannelRcSource {
        &self.rc
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn sim_time(&self) -> f64 {
        self.physics.sim_time()
    }

    /// Sends every scripted RC frame that has come due.
    fn deliver_rc(&mut self) {
        let now = self.physics.sim_time();
        send_due_frames(&self.rc_script, &mut self.next_rc_frame, now, &self.rc_tx);
    }

    /// Advances the simulation by one physics step.
    pub fn tick(&mut self) {
        // --- 1. Operator input ---
        self.deliver_rc();

        // --- 2. Firmware ---
        // Twice per tick, so work that is not gated on new IMU data also runs.
        self.firmware.run(&mut self.board);
        self.firmware.run(&mut self.board);

        // --- 3. Actuators to dynamics ---
        let outputs = self.board.outputs();
        trace!(?outputs, "PWM outputs");

        // --- 4. Physics ---
        self.physics.step(self.tick_period);
        self.ticks += 1;

        // --- 5. Ground truth ---
        let nwu = Odometry::from_truth(&self.physics.snapshot());
        let ned = nwu.to_ned();
        self.sink.publish(&nwu, &ned);
    }

    /// Runs ticks until `duration` seconds of simulation time have elapsed.
    pub fn run_for(&mut self, duration: f64) {
        let ticks = (duration / self.tick_period).round() as u64;
        info!(
            "Running {} ticks ({:.3} s at {:.0} Hz)",
            ticks,
            duration,
            1.0 / self.tick_period
        );
        for _ in 0..ticks {
            self.tick();
        }
        debug!("Finished at sim time {:.3} s", self.sim_time());
    }

    /// Puts the vehicle back at its starting pose. Board state, including
    /// biases and the clock, is untouched.
    pub fn reset(&mut self) {
        self.physics.reset();
        info!("Simulation reset at sim time {:.3} s", self.sim_time());
    }
}

/// Sends the frames of `script` from `*next` on whose time is at or before `now`,
/// advancing `*next` past them. Returns how many were sent. If the receiving end
/// is gone, the rest of the script is discarded.
fn send_due_frames(
    script: &[ScriptedRcFrame],
    next: &mut usize,
    now: f64,
    tx: &Sender<RcFrame>,
) -> usize {
    let mut sent = 0;
    while let Some(frame) = script.get(*next) {
        if frame.time > now {
            break;
        }
        if tx.send(RcFrame::from_slice(&frame.values)).is_err() {
            warn!(
                "RC delivery thread has stopped; dropping {} scripted frames",
                script.len() - *next
            );
            *next = script.len();
            break;
        }
        trace!("Sent scripted RC frame for t = {:.3} s", frame.time);
        *next += 1;
        sent += 1;
    }
    sent
}
