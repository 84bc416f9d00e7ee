mod config;
mod error;
mod export;
mod files;
mod gateway;
mod grammar;
mod picker;
mod recovery;
mod shell;

use std::sync::Arc;

use clap::Parser;
use manjaword_session::{HeadlessEditor, RecoveryOutcome, SessionController};
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use gateway::LocalCommandGateway;
use grammar::LanguageToolClient;
use picker::QueuedPicker;
use shell::Shell;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr, stdout belongs to the shell
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    let data_dir = config.effective_data_dir()?;
    let session_config = config.session_config();

    info!("Starting manjaword-local");
    info!("  Data dir: {}", data_dir.display());
    info!("  Autosave every {} secs", session_config.autosave_interval.as_secs());
    info!("  Grammar service: {} ({})", config.grammar_url, config.language);

    let picker = Arc::new(QueuedPicker::new());
    let gateway = Arc::new(LocalCommandGateway::new(
        &data_dir,
        picker.clone(),
        LanguageToolClient::new(config.grammar_url.clone(), config.language.clone()),
    ));
    info!("  Recovery snapshot: {}", gateway.recovery().path().display());
    let editor = Arc::new(HeadlessEditor::new());

    let session = SessionController::start(gateway, editor.clone(), session_config).await;
    if let RecoveryOutcome::Restored { updated_at } = session.recovery() {
        println!("Recovered unsaved document from {}", updated_at);
    }

    let shutdown_rx = create_shutdown_signal();
    Shell::new(session, editor, picker).run(shutdown_rx).await?;

    info!("Shutdown complete");
    Ok(())
}

/// Create a shutdown signal that triggers on Ctrl+C or SIGTERM.
fn create_shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        let ctrl_c = async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, initiating shutdown"),
                Err(e) => {
                    warn!("Failed to install Ctrl+C handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                    info!("Received SIGTERM, initiating shutdown");
                }
                Err(e) => {
                    warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        let _ = tx.send(true);
    });

    rx
}
