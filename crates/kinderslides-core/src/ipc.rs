use crate::topics::Topic;
use serde::{Deserialize, Serialize};

/// How a submission cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The submission timeout elapsed first.
    TimedOut,
    /// The window regained focus and stayed that way for the settle delay.
    /// Nothing from the job itself confirms this.
    AssumedSuccess,
}

/// Tracker phase as reported to clients. `Resolved` is never observable
/// from outside because it resets synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Armed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
}

impl NoticeLevel {
    pub fn icon(self) -> &'static str {
        match self {
            NoticeLevel::Success => "check-circle",
            NoticeLevel::Warning => "exclamation-triangle",
            NoticeLevel::Info => "info-circle",
        }
    }
}

/// Render instructions and replies from daemon to views/clients (JSON-lines over Unix socket).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DaemonMsg {
    /// Submit button state.
    #[serde(rename = "controls")]
    Controls {
        label: String,
        enabled: bool,
        /// Draw attention to the button (a topic is selected and nothing is in flight).
        pulse: bool,
    },
    /// Loading modal visibility.
    #[serde(rename = "modal")]
    Modal { visible: bool },
    /// Transient banner. Replaces any banner already shown.
    #[serde(rename = "notice")]
    Notice {
        level: NoticeLevel,
        message: String,
        icon: String,
        dismiss_after_ms: u64,
    },
    /// Contextual info for the selected topic.
    #[serde(rename = "topic_info")]
    TopicInfo {
        topic: Topic,
        description: String,
        icon: String,
        color: String,
    },
    /// Remove the topic info (selector cleared).
    #[serde(rename = "clear_topic_info")]
    ClearTopicInfo,
    /// Status response.
    #[serde(rename = "status")]
    Status {
        phase: Phase,
        active_topic: Option<Topic>,
        selected: Option<Topic>,
        last_outcome: Option<Outcome>,
        version: String,
    },
    /// Acknowledgement for commands.
    #[serde(rename = "ack")]
    Ack { ok: bool, message: String },
}

/// Page events from clients to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMsg {
    /// The topic selector changed. Empty means nothing selected.
    #[serde(rename = "select_topic")]
    SelectTopic { topic: String },
    /// The form was submitted with this selector value.
    #[serde(rename = "submit")]
    Submit { topic: String },
    /// The hosting window regained input focus.
    #[serde(rename = "window_focus")]
    WindowFocus,
    /// Request current status.
    #[serde(rename = "get_status")]
    GetStatus,
    /// View client announcing itself (receives render instructions).
    #[serde(rename = "register_view")]
    RegisterView,
}

/// Serialize a message as a JSON line (with trailing newline).
pub fn encode(msg: &impl Serialize) -> String {
    let mut s = serde_json::to_string(msg).expect("serialize IPC message");
    s.push('\n');
    s
}

/// Deserialize a JSON line. Returns None on empty/whitespace input.
pub fn decode_daemon(line: &str) -> Option<DaemonMsg> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}

pub fn decode_client(line: &str) -> Option<ClientMsg> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    serde_json::from_str(trimmed).ok()
}
