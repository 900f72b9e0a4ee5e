// silboard_sim/src/simulation/rc.rs

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace};

use silboard_core::abstractions::RcSource;
use silboard_core::actuators::{RcFrame, RcInbox};

use super::error::SimError;

/// An RC source fed through a channel. A dedicated thread forwards every frame
/// into whichever inbox the board last subscribed, so frames arrive
/// asynchronously to the tick loop, as they would from a radio.
#[derive(Debug)]
pub struct ChannelRcSource {
    connected: Arc<AtomicBool>,
    inbox: Arc<Mutex<Option<RcInbox>>>,
    delivered: Arc<AtomicU64>,
}

impl ChannelRcSource {
    /// Starts the delivery thread and returns the source together with the
    /// sender to push frames into. Dropping every sender stops the thread and
    /// marks the source disconnected.
    pub fn spawn(connected: bool) -> Result<(Self, Sender<RcFrame>), SimError> {
        let (frame_tx, frame_rx) = crossbeam_channel::unbounded();
        let source = Self {
            connected: Arc::new(AtomicBool::new(connected)),
            inbox: Arc::new(Mutex::new(None)),
            delivered: Arc::new(AtomicU64::new(0)),
        };

        let connected = Arc::clone(&source.connected);
        let inbox = Arc::clone(&source.inbox);
        let delivered = Arc::clone(&source.delivered);
        thread::Builder::new()
            .name("rc-delivery".to_string())
            .spawn(move || delivery_main(frame_rx, inbox, delivered, connected))
            .map_err(SimError::Spawn)?;

        Ok((source, frame_tx))
    }

    /// Marks the transmitter as present or absent.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Number of frames handed to an inbox so far.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::SeqCst)
    }
}

impl RcSource for ChannelRcSource {
    fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn subscribe(&self, inbox: RcInbox) {
        *self.inbox.lock() = Some(inbox);
    }
}

/// Main function for the delivery thread. Runs until the channel closes.
fn delivery_main(
    frame_rx: Receiver<RcFrame>,
    inbox: Arc<Mutex<Option<RcInbox>>>,
    delivered: Arc<AtomicU64>,
    connected: Arc<AtomicBool>,
) {
    for frame in frame_rx.iter() {
        match inbox.lock().as_ref() {
            Some(inbox) => {
                inbox.deliver(frame);
                delivered.fetch_add(1, Ordering::SeqCst);
            }
            None => trace!("Dropping RC frame: no board has subscribed yet"),
        }
    }
    connected.store(false, Ordering::SeqCst);
    debug!("RC producer closed, delivery thread exiting");
}
