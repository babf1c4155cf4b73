use std::sync::Arc;

use anyhow::Context;
use notify::{RecursiveMode, Watcher};
use tower_lsp::Client;
use tracing::{debug, error, info, warn};

use super::ShellState;
use super::notifications::RestartLanguageServer;

/// Watch the config file and regenerate on every observed change.
///
/// Events arriving while a regeneration is in flight are dropped: the
/// single-flight token is tried, not awaited. The generator mutes the store
/// around its own YAML rewrites, so those don't come back around.
pub async fn watch_config(state: Arc<ShellState>, client: Client) -> anyhow::Result<()> {
    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(8);
    let store = Arc::clone(&state.store);
    let config_path = store.path().to_owned();

    let mut watcher =
        notify::recommended_watcher(move |event: Result<notify::Event, notify::Error>| {
            match event {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if store.is_muted() {
                        debug!("ignoring self-inflicted config change");
                        return;
                    }
                    // A full channel already has a pending run queued.
                    tx.try_send(()).ok();
                }
                Ok(_) => {}
                Err(e) => warn!("config watch error: {e}"),
            }
        })
        .context("cannot create config watcher")?;
    watcher
        .watch(config_path.as_std_path(), RecursiveMode::NonRecursive)
        .with_context(|| format!("cannot watch {config_path}"))?;
    info!("watching {config_path}");

    while rx.recv().await.is_some() {
        info!("config file changed");
        // Spawned so a change arriving mid-run is dropped by the token
        // below instead of queueing up behind the running regeneration.
        let state = Arc::clone(&state);
        let client = client.clone();
        tokio::spawn(async move {
            run_and_notify(&state, &client).await;
        });
    }
    Ok(())
}

/// Run one regeneration under the single-flight token and, on clean
/// completion, tell the editor to restart its language services.
pub async fn run_and_notify(state: &ShellState, client: &Client) {
    let Ok(_token) = state.busy.try_lock() else {
        warn!("a regeneration is already in flight; dropping this event");
        return;
    };

    match state.generator.run().await {
        Ok(summary) => {
            info!(
                "regeneration complete: {} services generated",
                summary.generated_services.len()
            );
            client.send_notification::<RestartLanguageServer>(()).await;
        }
        Err(e) => {
            error!("regeneration failed: {e:#}");
        }
    }
}
