use rgo_core::{ProgressPhase, Reporter};
use tower_lsp::Client;
use tower_lsp::lsp_types::notification::Notification;

use super::notifications::{
    MessagePayload, Progress, ProgressPayload, ProgressStage, WindowShowError, WindowShowInfo,
    WindowShowWarn,
};

/// Forwards generator reports to the editor as custom notifications.
///
/// The [`Reporter`] methods are synchronous, so each notification is sent
/// from a detached task.
pub struct EditorReporter {
    client: Client,
}

impl EditorReporter {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn send<N>(&self, params: N::Params)
    where
        N: Notification + 'static,
        N::Params: Send + 'static,
    {
        let client = self.client.clone();
        tokio::spawn(async move {
            client.send_notification::<N>(params).await;
        });
    }

    fn progress(&self, phase: ProgressPhase, stage: ProgressStage) {
        self.send::<Progress>(ProgressPayload {
            token: phase.token().to_string(),
            message: phase.message().to_string(),
            stage,
        });
    }
}

impl std::fmt::Debug for EditorReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorReporter").finish_non_exhaustive()
    }
}

impl Reporter for EditorReporter {
    fn info(&self, message: &str) {
        self.send::<WindowShowInfo>(MessagePayload {
            message: message.to_string(),
        });
    }

    fn warn(&self, message: &str) {
        self.send::<WindowShowWarn>(MessagePayload {
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.send::<WindowShowError>(MessagePayload {
            message: message.to_string(),
        });
    }

    fn progress_begin(&self, phase: ProgressPhase) {
        self.progress(phase, ProgressStage::Start);
    }

    fn progress_end(&self, phase: ProgressPhase) {
        self.progress(phase, ProgressStage::Stop);
    }
}
