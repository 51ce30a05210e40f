use kinderslides_core::config::TrackerConfig;
use kinderslides_core::ipc::{Outcome, Phase};
use kinderslides_core::topics::{self, Topic};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Identifies one Idle → Armed → Resolved pass. Timer expiries carry the
/// cycle that armed them so a stale expiry can never touch a later cycle.
pub type CycleId = u64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select a topic before generating!")]
    NoTopic,
    #[error("'{0}' is not a topic we can generate. Please select a valid topic.")]
    UnknownTopic(String),
    #[error("A presentation is already being created. Please wait for it to finish.")]
    InFlight,
}

/// The single pending submission timeout. Lives inside `State::Armed`, so
/// leaving that state consumes it exactly once.
#[derive(Debug, PartialEq)]
struct TimeoutTimer {
    cycle: CycleId,
    deadline: Instant,
}

impl TimeoutTimer {
    fn arm(cycle: CycleId, now: Instant, after: Duration) -> Self {
        debug!(cycle, after_ms = after.as_millis() as u64, "submission timeout armed");
        Self {
            cycle,
            deadline: now + after,
        }
    }

    fn fire(self) {
        debug!(cycle = self.cycle, "submission timeout fired");
    }

    fn cancel(self) {
        debug!(cycle = self.cycle, "submission timeout cancelled");
    }
}

#[derive(Debug, PartialEq)]
enum State {
    /// Nothing in flight.
    Idle,
    /// A submission is in flight and its timeout is live.
    Armed {
        topic: Topic,
        timer: TimeoutTimer,
        /// Set by the first refocus; resolution happens once this passes.
        settle_at: Option<Instant>,
    },
    /// Outcome decided. Only held while resolution runs, then back to Idle.
    Resolved(Outcome),
}

/// Render instructions the tracker wants the page to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RenderBusy(Topic),
    RenderTimedOut,
    RenderSuccess,
}

/// Lifecycle of one in-flight generation request.
///
/// The browser never learns when the download finished, so completion is a
/// race between the submission timeout and the refocus heuristic. Whichever
/// fires first resolves the cycle; the other becomes a no-op.
pub struct ActionTracker {
    state: State,
    submission_timeout: Duration,
    settle_delay: Duration,
    next_cycle: CycleId,
    last_outcome: Option<Outcome>,
}

impl ActionTracker {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            state: State::Idle,
            submission_timeout: config.submission_timeout(),
            settle_delay: config.settle_delay(),
            next_cycle: 1,
            last_outcome: None,
        }
    }

    /// Begin a submission for the raw selector value.
    ///
    /// On error nothing changes: no state transition and no timer.
    pub fn start(&mut self, selection: &str, now: Instant) -> Result<Vec<Action>, ValidationError> {
        if !matches!(self.state, State::Idle) {
            return Err(ValidationError::InFlight);
        }
        let topic = match topics::parse_selection(selection) {
            Ok(Some(topic)) => topic,
            Ok(None) => return Err(ValidationError::NoTopic),
            Err(e) => return Err(ValidationError::UnknownTopic(e.0)),
        };

        let cycle = self.next_cycle;
        self.next_cycle += 1;
        let timer = TimeoutTimer::arm(cycle, now, self.submission_timeout);
        self.state = State::Armed {
            topic,
            timer,
            settle_at: None,
        };
        info!(topic = %topic, cycle, "submission armed");
        Ok(vec![Action::RenderBusy(topic)])
    }

    /// The timeout armed for `cycle` elapsed.
    pub fn on_timeout(&mut self, cycle: CycleId) -> Vec<Action> {
        self.resolve(cycle, Outcome::TimedOut)
    }

    /// The hosting window regained focus. Only starts the settle delay;
    /// resolution happens in `on_settle_elapsed`.
    pub fn on_window_refocus(&mut self, now: Instant) {
        match &mut self.state {
            State::Armed {
                timer, settle_at, ..
            } => {
                if settle_at.is_none() {
                    debug!(cycle = timer.cycle, "refocus seen, settling");
                    *settle_at = Some(now + self.settle_delay);
                }
            }
            _ => debug!("refocus ignored: nothing in flight"),
        }
    }

    /// The settle delay after a refocus elapsed for `cycle`.
    pub fn on_settle_elapsed(&mut self, cycle: CycleId) -> Vec<Action> {
        if !matches!(self.state, State::Armed { settle_at: Some(_), .. }) {
            debug!(cycle, "settle ignored: no refocus pending");
            return Vec::new();
        }
        self.resolve(cycle, Outcome::AssumedSuccess)
    }

    /// Fire whichever deadline has passed. When both have, the earlier one
    /// wins; on a tie the timeout does.
    pub fn check_timer(&mut self, now: Instant) -> Vec<Action> {
        let (cycle, timeout_at, settle_at) = match &self.state {
            State::Armed {
                timer, settle_at, ..
            } => (timer.cycle, timer.deadline, *settle_at),
            _ => return Vec::new(),
        };

        let timeout_due = timeout_at <= now;
        match settle_at.filter(|at| *at <= now) {
            Some(at) if !timeout_due || at < timeout_at => self.on_settle_elapsed(cycle),
            _ if timeout_due => self.on_timeout(cycle),
            _ => Vec::new(),
        }
    }

    /// Return the next `Instant` at which `check_timer()` needs to run,
    /// or `None` if nothing is in flight.
    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.state {
            State::Armed {
                timer, settle_at, ..
            } => Some(match settle_at {
                Some(at) => timer.deadline.min(*at),
                None => timer.deadline,
            }),
            _ => None,
        }
    }

    /// Back to Idle, forgetting the active topic.
    pub fn reset(&mut self) {
        if let State::Armed { timer, .. } = std::mem::replace(&mut self.state, State::Idle) {
            timer.cancel();
        }
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Armed { .. } => Phase::Armed,
            State::Idle | State::Resolved(_) => Phase::Idle,
        }
    }

    pub fn active_topic(&self) -> Option<Topic> {
        match &self.state {
            State::Armed { topic, .. } => Some(*topic),
            _ => None,
        }
    }

    pub fn active_cycle(&self) -> Option<CycleId> {
        match &self.state {
            State::Armed { timer, .. } => Some(timer.cycle),
            _ => None,
        }
    }

    pub fn last_outcome(&self) -> Option<Outcome> {
        self.last_outcome
    }

    fn resolve(&mut self, cycle: CycleId, outcome: Outcome) -> Vec<Action> {
        if self.active_cycle() != Some(cycle) {
            debug!(cycle, ?outcome, "late trigger ignored");
            return Vec::new();
        }
        let State::Armed { topic, timer, .. } =
            std::mem::replace(&mut self.state, State::Resolved(outcome))
        else {
            return Vec::new();
        };

        let action = match outcome {
            Outcome::TimedOut => {
                timer.fire();
                Action::RenderTimedOut
            }
            Outcome::AssumedSuccess => {
                timer.cancel();
                Action::RenderSuccess
            }
        };
        info!(topic = %topic, cycle, ?outcome, "submission resolved");
        self.last_outcome = Some(outcome);
        // The render is handed back to the caller; Resolved has nothing left
        // to hold, so the reset to Idle completes within this call.
        self.reset();
        vec![action]
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        self.state == State::Idle
    }
}
