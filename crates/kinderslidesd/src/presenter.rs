use kinderslides_core::config::NoticeConfig;
use kinderslides_core::ipc::{self, DaemonMsg, NoticeLevel};
use kinderslides_core::topics::Topic;
use tokio::sync::mpsc;
use tracing::debug;

pub const BUSY_LABEL: &str = "Creating Presentation...";
pub const DEFAULT_LABEL: &str = "Generate Presentation";
pub const TIMED_OUT_NOTICE: &str =
    "Generation is taking longer than expected. Please check if the download started.";
pub const SUCCESS_NOTICE: &str =
    "Presentation generated successfully! Check your downloads folder.";

/// Everything the page needs drawn. Implementations own all visual detail;
/// the page only says which state to show.
pub trait PresentationAdapter {
    /// A submission for `topic` is in flight.
    fn render_busy(&mut self, topic: Topic);
    /// The submission timed out. `selected` is the selector value now.
    fn render_timed_out(&mut self, selected: Option<Topic>);
    /// The submission is assumed to have finished. `selected` is the selector value now.
    fn render_success(&mut self, selected: Option<Topic>);
    fn render_validation_warning(&mut self, message: &str);
    /// The selector changed. While a submission is in flight the controls stay locked.
    fn render_selection(&mut self, selected: Option<Topic>, in_flight: bool);
}

/// Controls for a page with nothing in flight.
pub fn idle_controls(selected: Option<Topic>) -> DaemonMsg {
    match selected {
        Some(topic) => DaemonMsg::Controls {
            label: format!("Generate {} Presentation", topic),
            enabled: true,
            pulse: true,
        },
        None => DaemonMsg::Controls {
            label: DEFAULT_LABEL.into(),
            enabled: true,
            pulse: false,
        },
    }
}

pub fn topic_info(selected: Option<Topic>) -> DaemonMsg {
    match selected {
        Some(topic) => DaemonMsg::TopicInfo {
            topic,
            description: topic.description().into(),
            icon: topic.icon().into(),
            color: topic.color().into(),
        },
        None => DaemonMsg::ClearTopicInfo,
    }
}

fn busy_frames() -> Vec<DaemonMsg> {
    vec![
        DaemonMsg::Modal { visible: true },
        DaemonMsg::Controls {
            label: BUSY_LABEL.into(),
            enabled: false,
            pulse: false,
        },
    ]
}

fn selection_frames(selected: Option<Topic>, in_flight: bool) -> Vec<DaemonMsg> {
    if in_flight {
        vec![topic_info(selected)]
    } else {
        vec![idle_controls(selected), topic_info(selected)]
    }
}

/// Broadcasts render instructions to every registered view.
pub struct ViewBroadcast {
    views: Vec<mpsc::UnboundedSender<String>>,
    dismiss_after_ms: u64,
}

impl ViewBroadcast {
    pub fn new(config: &NoticeConfig) -> Self {
        Self {
            views: Vec::new(),
            dismiss_after_ms: config.dismiss_after_ms,
        }
    }

    /// Add a view. The current page state goes to the new view only; views
    /// already registered are up to date.
    pub fn register(
        &mut self,
        tx: mpsc::UnboundedSender<String>,
        selected: Option<Topic>,
        active: Option<Topic>,
    ) {
        let mut snapshot = selection_frames(selected, active.is_some());
        if active.is_some() {
            snapshot.extend(busy_frames());
        }
        if !snapshot.iter().all(|msg| tx.send(ipc::encode(msg)).is_ok()) {
            debug!("view closed before registration finished");
            return;
        }
        self.views.push(tx);
        debug!(views = self.views.len(), "view registered");
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    fn notice(&self, level: NoticeLevel, message: &str) -> DaemonMsg {
        DaemonMsg::Notice {
            level,
            message: message.into(),
            icon: level.icon().into(),
            dismiss_after_ms: self.dismiss_after_ms,
        }
    }

    fn send(&mut self, msgs: &[DaemonMsg]) {
        let lines: Vec<String> = msgs.iter().map(|msg| ipc::encode(msg)).collect();
        // Views whose connection closed drop out here.
        self.views
            .retain(|tx| lines.iter().all(|line| tx.send(line.clone()).is_ok()));
    }

    fn finish(&mut self, selected: Option<Topic>, level: NoticeLevel, message: &str) {
        let notice = self.notice(level, message);
        self.send(&[
            DaemonMsg::Modal { visible: false },
            idle_controls(selected),
            notice,
        ]);
    }
}

impl PresentationAdapter for ViewBroadcast {
    fn render_busy(&mut self, _topic: Topic) {
        self.send(&busy_frames());
    }

    fn render_timed_out(&mut self, selected: Option<Topic>) {
        self.finish(selected, NoticeLevel::Info, TIMED_OUT_NOTICE);
    }

    fn render_success(&mut self, selected: Option<Topic>) {
        self.finish(selected, NoticeLevel::Success, SUCCESS_NOTICE);
    }

    fn render_validation_warning(&mut self, message: &str) {
        let notice = self.notice(NoticeLevel::Warning, message);
        self.send(&[notice]);
    }

    fn render_selection(&mut self, selected: Option<Topic>, in_flight: bool) {
        self.send(&selection_frames(selected, in_flight));
    }
}
