// silboard_core/src/actuators.rs

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::abstractions::RcSource;

// --- PWM conventions ---
pub const NUM_PWM_OUTPUTS: usize = 14;
pub const NUM_RC_CHANNELS: usize = 8;
pub const THROTTLE_CHANNEL: usize = 2;
pub const PWM_MIN: u16 = 1000;
pub const PWM_CENTER: u16 = 1500;
/// Throttle output above which the motors are considered to be spinning.
pub const SPIN_THRESHOLD: u16 = 1100;

/// The value handed to the firmware for `channel` when no operator input exists.
pub fn failsafe_value(channel: usize) -> u16 {
    if channel == THROTTLE_CHANNEL {
        PWM_MIN
    } else {
        PWM_CENTER
    }
}

// =========================================================================
// == RC Frame ==
// =========================================================================

/// One frame of raw operator input, one PWM-style value per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RcFrame {
    pub values: [u16; NUM_RC_CHANNELS],
}

impl RcFrame {
    pub fn new(values: [u16; NUM_RC_CHANNELS]) -> Self {
        Self { values }
    }

    /// Builds a frame from however many values are available. Missing channels
    /// take their fail-safe value; extra values are dropped.
    pub fn from_slice(values: &[u16]) -> Self {
        let mut frame = Self::default();
        for (slot, value) in frame.values.iter_mut().zip(values) {
            *slot = *value;
        }
        frame
    }

    pub fn get(&self, channel: usize) -> Option<u16> {
        self.values.get(channel).copied()
    }
}

impl Default for RcFrame {
    /// Sticks centered, throttle and the two auxiliary switches low.
    fn default() -> Self {
        let mut values = [PWM_MIN; NUM_RC_CHANNELS];
        values[0] = PWM_CENTER;
        values[1] = PWM_CENTER;
        values[3] = PWM_CENTER;
        Self { values }
    }
}

// =========================================================================
// == RC Inbox ==
// =========================================================================

#[derive(Debug, Default)]
struct RcState {
    latest: RcFrame,
    received: bool,
}

/// The one piece of state shared between the asynchronous RC delivery path
/// and the tick-driven firmware reads. Cloning yields another handle to the
/// same state.
#[derive(Debug, Clone, Default)]
pub struct RcInbox {
    state: Arc<Mutex<RcState>>,
}

impl RcInbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `frame` as the latest input and marks RC as received.
    pub fn deliver(&self, frame: RcFrame) {
        let mut state = self.state.lock();
        state.latest = frame;
        state.received = true;
    }

    pub fn latest(&self) -> RcFrame {
        self.state.lock().latest
    }

    pub fn received(&self) -> bool {
        self.state.lock().received
    }
}

// =========================================================================
// == Actuator I/O ==
// =========================================================================

/// Captures the firmware's PWM outputs and serves RC input back to it.
pub struct ActuatorIo {
    pwm_outputs: [u16; NUM_PWM_OUTPUTS],
    inbox: RcInbox,
    source: Option<Arc<dyn RcSource>>,
}

impl fmt::Debug for ActuatorIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActuatorIo")
            .field("pwm_outputs", &self.pwm_outputs)
            .field("inbox", &self.inbox)
            .field("subscribed", &self.source.is_some())
            .finish()
    }
}

impl Default for ActuatorIo {
    fn default() -> Self {
        Self {
            pwm_outputs: [PWM_MIN; NUM_PWM_OUTPUTS],
            inbox: RcInbox::new(),
            source: None,
        }
    }
}

impl ActuatorIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets every output to minimum, clears the received flag and subscribes
    /// a fresh inbox to `source`.
    pub fn init(&mut self, source: Arc<dyn RcSource>) {
        self.pwm_outputs = [PWM_MIN; NUM_PWM_OUTPUTS];
        self.inbox = RcInbox::new();
        source.subscribe(self.inbox.clone());
        self.source = Some(source);
    }

    fn connected(&self) -> bool {
        self.source.as_ref().is_some_and(|source| source.connected())
    }

    /// The operator's value for `channel`, or its fail-safe value when no RC
    /// source is connected or the channel does not exist.
    pub fn read(&self, channel: usize) -> u16 {
        if !self.connected() {
            return failsafe_value(channel);
        }
        self.inbox
            .latest()
            .get(channel)
            .unwrap_or_else(|| failsafe_value(channel))
    }

    pub fn write(&mut self, channel: usize, value: u16) {
        match self.pwm_outputs.get_mut(channel) {
            Some(slot) => *slot = value,
            None => warn!(
                "Ignoring PWM write of {} to channel {}: only {} outputs exist",
                value, channel, NUM_PWM_OUTPUTS
            ),
        }
    }

    /// True until the first RC frame arrives.
    pub fn lost(&self) -> bool {
        !self.inbox.received()
    }

    pub fn motors_spinning(&self) -> bool {
        self.pwm_outputs[THROTTLE_CHANNEL] > SPIN_THRESHOLD
    }

    pub fn outputs(&self) -> [u16; NUM_PWM_OUTPUTS] {
        self.pwm_outputs
    }

    pub fn inbox(&self) -> &RcInbox {
        &self.inbox
    }
}
