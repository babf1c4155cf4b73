use tracing::{error, info, warn};

/// Long-running phases surfaced to the editor as progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    FetchIdl,
    CodeGen,
}

impl ProgressPhase {
    /// Stable token identifying the progress series.
    pub fn token(self) -> &'static str {
        match self {
            ProgressPhase::FetchIdl => "rgo_progress_idl",
            ProgressPhase::CodeGen => "rgo_progress_src",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ProgressPhase::FetchIdl => "RGO fetching idl repos...",
            ProgressPhase::CodeGen => "RGO generating src code...",
        }
    }
}

/// Where the generator reports progress and user-facing messages.
///
/// The default implementation logs; the LSP shell forwards to the editor.
pub trait Reporter: Send + Sync + std::fmt::Debug {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn progress_begin(&self, phase: ProgressPhase);
    fn progress_end(&self, phase: ProgressPhase);
}

/// Reports through `tracing` only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn info(&self, message: &str) {
        info!("{message}");
    }

    fn warn(&self, message: &str) {
        warn!("{message}");
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }

    fn progress_begin(&self, phase: ProgressPhase) {
        info!("{}", phase.message());
    }

    fn progress_end(&self, phase: ProgressPhase) {
        info!("{} done", phase.token());
    }
}
