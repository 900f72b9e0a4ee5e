// silboard_sim/src/simulation/truth.rs

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

use silboard_core::messages::Odometry;

// --- TRUTH SINK ---
/// Receives the exact vehicle state once per physics tick, in both world frames.
pub trait TruthSink: Send {
    fn publish(&mut self, nwu: &Odometry, ned: &Odometry);
}

/// Writes ground truth to the log at `trace` level.
#[derive(Debug, Default)]
pub struct LogTruthSink;

impl TruthSink for LogTruthSink {
    fn publish(&mut self, nwu: &Odometry, ned: &Odometry) {
        let p = ned.pose.translation.vector;
        trace!(
            t = nwu.timestamp,
            north = p.x,
            east = p.y,
            down = p.z,
            "truth"
        );
    }
}

/// Keeps every published pair of messages. Clones share the same record, so
/// a copy can be inspected after the original was handed to a runner.
#[derive(Debug, Clone, Default)]
pub struct RecordingTruthSink {
    records: Arc<Mutex<Vec<(Odometry, Odometry)>>>,
}

impl RecordingTruthSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(nwu, ned)` pair published so far, oldest first.
    pub fn records(&self) -> Vec<(Odometry, Odometry)> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TruthSink for RecordingTruthSink {
    fn publish(&mut self, nwu: &Odometry, ned: &Odometry) {
        self.records.lock().push((nwu.clone(), ned.clone()));
    }
}
