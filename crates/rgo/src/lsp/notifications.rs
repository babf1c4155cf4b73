//! Custom notifications relayed to the editor extension.

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::notification::Notification;

/// Tells the editor to restart its Go language services so they re-query
/// the packages driver. Sent after every successful regeneration.
#[derive(Debug)]
pub enum RestartLanguageServer {}

impl Notification for RestartLanguageServer {
    type Params = ();
    const METHOD: &'static str = "custom/rgo/restart_language_server";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePayload {
    pub message: String,
}

#[derive(Debug)]
pub enum WindowShowInfo {}

impl Notification for WindowShowInfo {
    type Params = MessagePayload;
    const METHOD: &'static str = "custom/rgo/window_show_info";
}

#[derive(Debug)]
pub enum WindowShowWarn {}

impl Notification for WindowShowWarn {
    type Params = MessagePayload;
    const METHOD: &'static str = "custom/rgo/window_show_warn";
}

#[derive(Debug)]
pub enum WindowShowError {}

impl Notification for WindowShowError {
    type Params = MessagePayload;
    const METHOD: &'static str = "custom/rgo/window_show_error";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStage {
    Start,
    Stop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressPayload {
    pub token: String,
    pub message: String,
    pub stage: ProgressStage,
}

/// Progress of the IDL-fetch and code-generation phases.
#[derive(Debug)]
pub enum Progress {}

impl Notification for Progress {
    type Params = ProgressPayload;
    const METHOD: &'static str = "custom/rgo/progress";
}
