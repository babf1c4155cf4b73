//! The language-server shell.
//!
//! The server implements no language intelligence: every text-document
//! capability is a no-op. Its real duty is hosting the generator — run it at
//! startup and on every config change, and tell the editor to restart its
//! language services afterwards so gopls re-queries the packages driver.

mod notifications;
mod reporter;
mod watch;

use std::sync::Arc;
use std::time::Duration;

use rgo_core::{ConfigStore, RgoGenerator, WorkspacePaths};
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use reporter::EditorReporter;

pub(crate) struct ShellState {
    pub generator: RgoGenerator,
    pub store: Arc<ConfigStore>,
    /// Single-flight token: at most one regeneration per workspace.
    pub busy: Arc<Mutex<()>>,
}

/// Run the LSP shell over stdio until the client disconnects or the process
/// receives an interrupt/terminate signal.
pub async fn run() -> anyhow::Result<()> {
    let paths = WorkspacePaths::from_current_dir()?;
    init_logs(&paths);

    let store = Arc::new(ConfigStore::new(paths.config_file()));
    let busy = Arc::new(Mutex::new(()));
    let busy_for_shutdown = Arc::clone(&busy);

    let (service, socket) = LspService::new(move |client| {
        let reporter = Arc::new(EditorReporter::new(client.clone()));
        let generator =
            RgoGenerator::new(paths.clone(), Arc::clone(&store)).with_reporter(reporter);
        RgoLanguageServer {
            client,
            state: Arc::new(ShellState {
                generator,
                store: Arc::clone(&store),
                busy: Arc::clone(&busy),
            }),
        }
    });

    let server = Server::new(tokio::io::stdin(), tokio::io::stdout(), socket).serve(service);

    tokio::select! {
        () = server => {
            info!("lsp client disconnected");
        }
        () = shutdown_signal() => {
            info!("received shutdown signal");
            // Let an in-flight regeneration finish, bounded at two seconds.
            let drained =
                tokio::time::timeout(Duration::from_secs(2), busy_for_shutdown.lock()).await;
            if drained.is_err() {
                warn!("a regeneration is still in flight; exiting anyway");
            }
        }
    }
    Ok(())
}

/// stdout carries the protocol, so logs go to a file in the cache.
fn init_logs(paths: &WorkspacePaths) {
    let log_dir = paths.log_dir();
    fs_err::create_dir_all(&log_dir).ok();
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("rgo_lsp.log"))
    else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("RGO_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .ok();
}

async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(_) => {
            // No signal handler: wait for ctrl-c only.
            tokio::signal::ctrl_c().await.ok();
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

struct RgoLanguageServer {
    client: Client,
    state: Arc<ShellState>,
}

#[tower_lsp::async_trait]
impl LanguageServer for RgoLanguageServer {
    async fn initialize(&self, _: InitializeParams) -> LspResult<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![".".to_string()]),
                    ..Default::default()
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "rgo".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("rgo lsp initialized");
        let state = Arc::clone(&self.state);
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = watch::watch_config(Arc::clone(&state), client.clone()).await {
                tracing::error!("config watcher stopped: {e:#}");
            }
        });

        let state = Arc::clone(&self.state);
        let client = self.client.clone();
        tokio::spawn(async move {
            watch::run_and_notify(&state, &client).await;
        });
    }

    async fn shutdown(&self) -> LspResult<()> {
        Ok(())
    }

    // Everything below is a deliberate no-op: the IDE gets its answers from
    // gopls; this server only orchestrates regeneration.

    async fn completion(&self, _: CompletionParams) -> LspResult<Option<CompletionResponse>> {
        Ok(None)
    }

    async fn hover(&self, _: HoverParams) -> LspResult<Option<Hover>> {
        Ok(None)
    }

    async fn goto_definition(
        &self,
        _: GotoDefinitionParams,
    ) -> LspResult<Option<GotoDefinitionResponse>> {
        Ok(None)
    }

    async fn references(&self, _: ReferenceParams) -> LspResult<Option<Vec<Location>>> {
        Ok(None)
    }

    async fn document_highlight(
        &self,
        _: DocumentHighlightParams,
    ) -> LspResult<Option<Vec<DocumentHighlight>>> {
        Ok(None)
    }

    async fn document_symbol(
        &self,
        _: DocumentSymbolParams,
    ) -> LspResult<Option<DocumentSymbolResponse>> {
        Ok(None)
    }

    async fn code_action(&self, _: CodeActionParams) -> LspResult<Option<CodeActionResponse>> {
        Ok(None)
    }

    async fn formatting(&self, _: DocumentFormattingParams) -> LspResult<Option<Vec<TextEdit>>> {
        Ok(None)
    }

    async fn rename(&self, _: RenameParams) -> LspResult<Option<WorkspaceEdit>> {
        Ok(None)
    }

    async fn folding_range(&self, _: FoldingRangeParams) -> LspResult<Option<Vec<FoldingRange>>> {
        Ok(None)
    }

    async fn execute_command(
        &self,
        _: ExecuteCommandParams,
    ) -> LspResult<Option<serde_json::Value>> {
        Ok(None)
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        debug!("did_open {}", params.text_document.uri);
    }

    async fn did_change(&self, _: DidChangeTextDocumentParams) {}

    async fn did_save(&self, _: DidSaveTextDocumentParams) {}

    async fn did_close(&self, _: DidCloseTextDocumentParams) {}

    async fn did_change_configuration(&self, _: DidChangeConfigurationParams) {}

    async fn did_change_watched_files(&self, _: DidChangeWatchedFilesParams) {}
}
