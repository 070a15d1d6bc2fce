//! Debounce and cooldown decisions for automatic captures.
//!
//! [`CaptureTrigger`] is a pure state machine fed with one people count per
//! frame. It never sleeps or spawns; the capture loop owns the clock and asks
//! it what to do.
//!
//! ```text
//!   Idle --eligible--> Armed { fire_at } --deadline--> Capturing --done--> Idle
//!     ^                    |
//!     +----ineligible------+
//! ```

use std::time::Duration;

use tokio::time::Instant;

/// Minimum number of people in frame to trigger a photo.
pub const MIN_PEOPLE: usize = 1;

/// Minimum spacing between successful captures.
pub const COOLDOWN: Duration = Duration::from_millis(5000);

/// How long people must stay in frame before the photo is taken.
pub const DETECTION_DELAY: Duration = Duration::from_millis(1000);

/// Tunables for the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerPolicy {
    pub min_people: usize,
    pub cooldown: Duration,
    pub detection_delay: Duration,
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        Self {
            min_people: MIN_PEOPLE,
            cooldown: COOLDOWN,
            detection_delay: DETECTION_DELAY,
        }
    }
}

/// Where the trigger is in the capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Nothing scheduled, nothing uploading.
    Idle,
    /// A capture fires at `fire_at` unless eligibility is lost first.
    Armed { fire_at: Instant },
    /// A capture has fired and its upload has not finished.
    Capturing,
}

/// What an observation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    /// A fresh debounce window was opened.
    Armed { fire_at: Instant },
    /// The pending capture was cancelled.
    Disarmed,
}

#[derive(Debug, Clone)]
pub struct CaptureTrigger {
    policy: TriggerPolicy,
    state: CaptureState,
    last_capture: Option<Instant>,
}

impl CaptureTrigger {
    pub fn new(policy: TriggerPolicy) -> Self {
        Self {
            policy,
            state: CaptureState::Idle,
            last_capture: None,
        }
    }

    pub fn policy(&self) -> &TriggerPolicy {
        &self.policy
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Completion time of the last successful capture.
    pub fn last_capture(&self) -> Option<Instant> {
        self.last_capture
    }

    /// When the pending capture fires, if one is armed.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            CaptureState::Armed { fire_at } => Some(fire_at),
            _ => None,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.state == CaptureState::Capturing
    }

    /// Enough people, and strictly more than the cooldown since the last
    /// successful capture.
    pub fn is_eligible(&self, people: usize, now: Instant) -> bool {
        people >= self.policy.min_people
            && self
                .last_capture
                .map_or(true, |at| now.saturating_duration_since(at) > self.policy.cooldown)
    }

    /// Feed the people count of one frame.
    ///
    /// A single ineligible frame cancels a pending capture; the next eligible
    /// frame opens a full new window. Observations made while capturing do
    /// not change anything.
    pub fn observe(&mut self, people: usize, now: Instant) -> Transition {
        let eligible = self.is_eligible(people, now);
        match (self.state, eligible) {
            (CaptureState::Idle, true) => {
                let fire_at = now + self.policy.detection_delay;
                self.state = CaptureState::Armed { fire_at };
                Transition::Armed { fire_at }
            }
            (CaptureState::Armed { .. }, false) => {
                self.state = CaptureState::Idle;
                Transition::Disarmed
            }
            _ => Transition::Unchanged,
        }
    }

    /// Try to fire the pending capture. Returns true when the caller should
    /// take and upload a photo now.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.state {
            CaptureState::Armed { fire_at } if now >= fire_at => {
                self.state = CaptureState::Capturing;
                true
            }
            _ => false,
        }
    }

    /// Record the end of a capture. Only a success starts the cooldown.
    pub fn complete(&mut self, succeeded: bool, now: Instant) {
        if self.state != CaptureState::Capturing {
            return;
        }
        self.state = CaptureState::Idle;
        if succeeded {
            self.last_capture = Some(now);
        }
    }
}

impl Default for CaptureTrigger {
    fn default() -> Self {
        Self::new(TriggerPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Feed `counts` at `step` spacing starting at `t0`, firing whenever the
    /// deadline has passed, completing every capture immediately with
    /// `succeed`. Returns fire times relative to `t0`.
    fn drive(counts: &[usize], step: Duration, succeed: bool) -> Vec<Duration> {
        let t0 = Instant::now();
        let mut trigger = CaptureTrigger::default();
        let mut fired = Vec::new();
        let end = step * counts.len() as u32;

        // Walk in 10ms steps so deadlines between samples are honoured.
        let mut t = Duration::ZERO;
        while t <= end {
            let now = t0 + t;
            if trigger.fire(now) {
                fired.push(t);
                trigger.complete(succeed, now);
            }
            if t.as_millis() % step.as_millis() == 0 {
                let i = (t.as_millis() / step.as_millis()) as usize;
                let people = counts.get(i).copied().unwrap_or(0);
                trigger.observe(people, now);
            }
            t += ms(10);
        }
        fired
    }

    #[test]
    fn test_defaults() {
        let policy = TriggerPolicy::default();
        assert_eq!(policy.min_people, 1);
        assert_eq!(policy.cooldown, ms(5000));
        assert_eq!(policy.detection_delay, ms(1000));
    }

    #[test]
    fn test_eligible_arms_once() {
        let now = Instant::now();
        let mut trigger = CaptureTrigger::default();
        assert_eq!(
            trigger.observe(1, now),
            Transition::Armed {
                fire_at: now + ms(1000)
            }
        );
        // Staying eligible keeps the original deadline.
        assert_eq!(trigger.observe(2, now + ms(200)), Transition::Unchanged);
        assert_eq!(trigger.deadline(), Some(now + ms(1000)));
    }

    #[test]
    fn test_zero_people_never_arms() {
        let now = Instant::now();
        let mut trigger = CaptureTrigger::default();
        assert_eq!(trigger.observe(0, now), Transition::Unchanged);
        assert_eq!(trigger.state(), CaptureState::Idle);
    }

    #[test]
    fn test_fire_before_deadline_is_refused() {
        let now = Instant::now();
        let mut trigger = CaptureTrigger::default();
        trigger.observe(1, now);
        assert!(!trigger.fire(now + ms(999)));
        assert!(trigger.fire(now + ms(1000)));
        assert!(trigger.in_flight());
        assert_eq!(trigger.deadline(), None);
    }

    #[test]
    fn test_no_arming_while_capturing() {
        let now = Instant::now();
        let mut trigger = CaptureTrigger::default();
        trigger.observe(1, now);
        assert!(trigger.fire(now + ms(1000)));

        assert_eq!(trigger.observe(3, now + ms(1100)), Transition::Unchanged);
        assert_eq!(trigger.observe(0, now + ms(1200)), Transition::Unchanged);
        assert_eq!(trigger.state(), CaptureState::Capturing);
        assert!(!trigger.fire(now + ms(5000)));
    }

    #[test]
    fn test_losing_people_cancels_and_restarts_full_window() {
        let now = Instant::now();
        let mut trigger = CaptureTrigger::default();
        trigger.observe(1, now);
        assert_eq!(trigger.observe(0, now + ms(900)), Transition::Disarmed);
        assert!(!trigger.fire(now + ms(1000)));

        assert_eq!(
            trigger.observe(1, now + ms(950)),
            Transition::Armed {
                fire_at: now + ms(1950)
            }
        );
        assert!(!trigger.fire(now + ms(1900)));
        assert!(trigger.fire(now + ms(1950)));
    }

    #[test]
    fn test_success_starts_cooldown() {
        let now = Instant::now();
        let mut trigger = CaptureTrigger::default();
        trigger.observe(1, now);
        trigger.fire(now + ms(1000));
        trigger.complete(true, now + ms(1200));
        assert_eq!(trigger.last_capture(), Some(now + ms(1200)));

        // Exactly at the cooldown boundary is still cooling down.
        assert!(!trigger.is_eligible(1, now + ms(6200)));
        assert!(trigger.is_eligible(1, now + ms(6201)));
        assert_eq!(trigger.observe(1, now + ms(3200)), Transition::Unchanged);
    }

    #[test]
    fn test_failure_does_not_start_cooldown() {
        let now = Instant::now();
        let mut trigger = CaptureTrigger::default();
        trigger.observe(1, now);
        trigger.fire(now + ms(1000));
        trigger.complete(false, now + ms(1100));

        assert_eq!(trigger.state(), CaptureState::Idle);
        assert_eq!(trigger.last_capture(), None);
        assert!(matches!(
            trigger.observe(1, now + ms(1200)),
            Transition::Armed { .. }
        ));
    }

    #[test]
    fn test_complete_without_capture_is_ignored() {
        let now = Instant::now();
        let mut trigger = CaptureTrigger::default();
        trigger.complete(true, now);
        assert_eq!(trigger.last_capture(), None);
    }

    #[test]
    fn test_sequence_single_capture_one_second_after_first_person() {
        let fired = drive(&[0, 1, 1, 1, 1, 1], ms(200), true);
        assert_eq!(fired, vec![ms(1200)]);
    }

    #[test]
    fn test_sequence_dropout_restarts_debounce() {
        let fired = drive(&[1, 1, 0, 1, 1, 1, 1, 1], ms(200), true);
        assert_eq!(fired, vec![ms(1600)]);
    }

    #[test]
    fn test_continuous_people_respects_cooldown() {
        let counts = vec![1; 60]; // 12 seconds of people
        let fired = drive(&counts, ms(200), true);
        assert!(fired.len() >= 2);
        for pair in fired.windows(2) {
            assert!(pair[1] - pair[0] > ms(5000), "captures too close: {:?}", pair);
        }
    }

    #[test]
    fn test_continuous_people_with_failures_retries_after_debounce() {
        let counts = vec![1; 20];
        let fired = drive(&counts, ms(200), false);
        // No cooldown after failures, each retry waits a full debounce.
        assert!(fired.len() >= 2);
        for pair in fired.windows(2) {
            assert!(pair[1] - pair[0] >= ms(1000));
        }
    }
}
