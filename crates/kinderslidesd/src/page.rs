use crate::presenter::PresentationAdapter;
use crate::tracker::{Action, ActionTracker, ValidationError};
use kinderslides_core::config::Config;
use kinderslides_core::ipc::{DaemonMsg, Phase};
use kinderslides_core::topics::{self, Topic, UnknownTopic};
use std::time::Instant;
use tracing::{info, warn};

/// The generator form: topic selector, submission tracker and whatever renders them.
pub struct Page<A: PresentationAdapter> {
    tracker: ActionTracker,
    selected: Option<Topic>,
    adapter: A,
}

impl<A: PresentationAdapter> Page<A> {
    pub fn new(config: &Config, adapter: A) -> Self {
        Self {
            tracker: ActionTracker::new(&config.tracker),
            selected: None,
            adapter,
        }
    }

    /// The topic selector changed. An unknown value leaves the selection as it was.
    pub fn select_topic(&mut self, raw: &str) -> Result<Option<Topic>, UnknownTopic> {
        let selected = topics::parse_selection(raw)?;
        self.selected = selected;
        let in_flight = self.tracker.phase() == Phase::Armed;
        self.adapter.render_selection(selected, in_flight);
        Ok(selected)
    }

    /// The form was submitted with the selector value `raw`.
    pub fn submit(&mut self, raw: &str, now: Instant) -> Result<(), ValidationError> {
        match self.tracker.start(raw, now) {
            Ok(actions) => {
                self.selected = self.tracker.active_topic();
                self.apply(actions);
                Ok(())
            }
            Err(e) => {
                warn!(selection = raw, error = %e, "submission rejected");
                self.adapter.render_validation_warning(&e.to_string());
                Err(e)
            }
        }
    }

    pub fn window_focused(&mut self, now: Instant) {
        self.tracker.on_window_refocus(now);
    }

    /// Run any deadline that has passed by `now`.
    pub fn tick(&mut self, now: Instant) {
        let actions = self.tracker.check_timer(now);
        self.apply(actions);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.tracker.next_deadline()
    }

    pub fn selected(&self) -> Option<Topic> {
        self.selected
    }

    /// Topic of the submission in flight, if any.
    pub fn active_topic(&self) -> Option<Topic> {
        self.tracker.active_topic()
    }

    pub fn status(&self, version: &str) -> DaemonMsg {
        DaemonMsg::Status {
            phase: self.tracker.phase(),
            active_topic: self.tracker.active_topic(),
            selected: self.selected,
            last_outcome: self.tracker.last_outcome(),
            version: version.to_string(),
        }
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    fn apply(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::RenderBusy(topic) => self.adapter.render_busy(topic),
                Action::RenderTimedOut => {
                    info!("presentation still pending, released controls");
                    self.adapter.render_timed_out(self.selected);
                }
                Action::RenderSuccess => {
                    info!("presentation assumed downloaded");
                    self.adapter.render_success(self.selected);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinderslides_core::ipc::Outcome;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Busy(Topic),
        TimedOut(Option<Topic>),
        Success(Option<Topic>),
        Warning(String),
        Selection(Option<Topic>, bool),
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl PresentationAdapter for Recorder {
        fn render_busy(&mut self, topic: Topic) {
            self.calls.push(Call::Busy(topic));
        }
        fn render_timed_out(&mut self, selected: Option<Topic>) {
            self.calls.push(Call::TimedOut(selected));
        }
        fn render_success(&mut self, selected: Option<Topic>) {
            self.calls.push(Call::Success(selected));
        }
        fn render_validation_warning(&mut self, message: &str) {
            self.calls.push(Call::Warning(message.to_string()));
        }
        fn render_selection(&mut self, selected: Option<Topic>, in_flight: bool) {
            self.calls.push(Call::Selection(selected, in_flight));
        }
    }

    fn make_page() -> Page<Recorder> {
        Page::new(&Config::default(), Recorder::default())
    }

    fn at(t0: Instant, ms: u64) -> Instant {
        t0 + Duration::from_millis(ms)
    }

    fn calls(page: &mut Page<Recorder>) -> Vec<Call> {
        std::mem::take(&mut page.adapter_mut().calls)
    }

    fn phase(page: &Page<Recorder>) -> Phase {
        match page.status("test") {
            DaemonMsg::Status { phase, .. } => phase,
            _ => unreachable!(),
        }
    }

    // === Scenario: timeout with no refocus ===

    #[test]
    fn timeout_renders_timed_out_exactly_once() {
        let mut page = make_page();
        let t0 = Instant::now();
        assert_eq!(page.submit("ABC", t0), Ok(()));
        assert_eq!(calls(&mut page), vec![Call::Busy(Topic::Abc)]);

        page.tick(at(t0, 30_000));
        assert_eq!(calls(&mut page), vec![Call::TimedOut(Some(Topic::Abc))]);
        assert_eq!(phase(&page), Phase::Idle);

        page.tick(at(t0, 60_000));
        page.window_focused(at(t0, 61_000));
        page.tick(at(t0, 70_000));
        assert!(calls(&mut page).is_empty());
    }

    // === Scenario: refocus at 500ms ===

    #[test]
    fn refocus_renders_success_and_timeout_never_follows() {
        let mut page = make_page();
        let t0 = Instant::now();
        page.submit("Shapes", t0).unwrap();
        calls(&mut page);

        page.window_focused(at(t0, 500));
        page.tick(at(t0, 2_000));
        assert!(calls(&mut page).is_empty(), "settle delay not over yet");

        page.tick(at(t0, 2_500));
        assert_eq!(calls(&mut page), vec![Call::Success(Some(Topic::Shapes))]);
        assert_eq!(phase(&page), Phase::Idle);
        assert!(page.next_deadline().is_none());

        page.tick(at(t0, 30_000));
        assert!(calls(&mut page).is_empty(), "no timed-out render after success");
    }

    // === Scenario: nothing selected ===

    #[test]
    fn empty_submit_warns_once_and_stays_idle() {
        let mut page = make_page();
        let err = page.submit("", Instant::now()).unwrap_err();
        assert_eq!(err, ValidationError::NoTopic);
        assert_eq!(
            calls(&mut page),
            vec![Call::Warning("Please select a topic before generating!".into())]
        );
        assert_eq!(phase(&page), Phase::Idle);
        assert!(page.next_deadline().is_none());
    }

    #[test]
    fn submit_while_in_flight_warns_and_keeps_cycle() {
        let mut page = make_page();
        let t0 = Instant::now();
        page.submit("ABC", t0).unwrap();
        calls(&mut page);

        assert_eq!(page.submit("ABC", at(t0, 10)), Err(ValidationError::InFlight));
        assert!(matches!(calls(&mut page).as_slice(), [Call::Warning(_)]));
        assert_eq!(page.next_deadline(), Some(at(t0, 30_000)));
    }

    // === Button label after resolution ===

    #[test]
    fn resolution_uses_current_selector_not_submitted_topic() {
        let mut page = make_page();
        let t0 = Instant::now();
        page.select_topic("Shapes").unwrap();
        page.submit("Shapes", t0).unwrap();
        page.select_topic("Colors").unwrap();
        calls(&mut page);

        page.window_focused(at(t0, 100));
        page.tick(at(t0, 2_100));
        assert_eq!(calls(&mut page), vec![Call::Success(Some(Topic::Colors))]);
    }

    #[test]
    fn selection_during_flight_is_marked_in_flight() {
        let mut page = make_page();
        page.submit("ABC", Instant::now()).unwrap();
        calls(&mut page);

        page.select_topic("").unwrap();
        assert_eq!(calls(&mut page), vec![Call::Selection(None, true)]);
    }

    #[test]
    fn unknown_selection_keeps_previous_value() {
        let mut page = make_page();
        page.select_topic("ABC").unwrap();
        calls(&mut page);

        assert!(page.select_topic("Planets").is_err());
        assert!(calls(&mut page).is_empty());
        match page.status("test") {
            DaemonMsg::Status { selected, .. } => assert_eq!(selected, Some(Topic::Abc)),
            _ => unreachable!(),
        }
    }

    // === Repeatability ===

    #[test]
    fn full_cycle_repeats_identically() {
        let mut page = make_page();
        let t0 = Instant::now();

        for round in 0..3u64 {
            let start = at(t0, round * 40_000);
            page.submit("Colors", start).unwrap();
            assert_eq!(calls(&mut page), vec![Call::Busy(Topic::Colors)]);
            assert_eq!(page.next_deadline(), Some(at(start, 30_000)));

            page.tick(at(start, 30_000));
            assert_eq!(calls(&mut page), vec![Call::TimedOut(Some(Topic::Colors))]);
            assert!(page.next_deadline().is_none());
        }
    }

    #[test]
    fn status_reports_active_cycle_and_last_outcome() {
        let mut page = make_page();
        let t0 = Instant::now();
        page.submit("Numbers 1-5", t0).unwrap();
        match page.status("0.1.0") {
            DaemonMsg::Status { phase, active_topic, last_outcome, version, .. } => {
                assert_eq!(phase, Phase::Armed);
                assert_eq!(active_topic, Some(Topic::Numbers));
                assert_eq!(last_outcome, None);
                assert_eq!(version, "0.1.0");
            }
            _ => unreachable!(),
        }

        page.tick(at(t0, 30_000));
        match page.status("0.1.0") {
            DaemonMsg::Status { active_topic, last_outcome, .. } => {
                assert_eq!(active_topic, None);
                assert_eq!(last_outcome, Some(Outcome::TimedOut));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn snapshot_accessors_follow_the_cycle() {
        let t0 = Instant::now();
        let mut page = make_page();
        page.select_topic("Colors").unwrap();
        page.submit("ABC", t0).unwrap();
        calls(&mut page);

        assert_eq!(page.selected(), Some(Topic::Colors));
        assert_eq!(page.active_topic(), Some(Topic::Abc));
        assert!(calls(&mut page).is_empty(), "accessors must not render");

        page.tick(at(t0, 30_000));
        assert_eq!(page.active_topic(), None);
        assert_eq!(page.selected(), Some(Topic::Colors));
    }
}
