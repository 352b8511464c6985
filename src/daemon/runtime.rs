//! Daemon wiring: builds the timer, bridge and coach and serves IPC.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::chat::{ChatBackend, ChatProvider, ChatSettings, OpenAiCompatibleBackend};
use crate::coach::Coach;
use crate::notification::{self, NotificationSender};
use crate::speech::{CommandSpeech, SpeechCapability, UnsupportedSpeech};
use crate::types::CoachConfig;

use super::bridge::{BreakNotifier, BreakPromptInjector, EventBridge};
use super::ipc::{handle_connection, IpcServer, RequestHandler};
use super::service::TimerService;
use super::timer::TimerEngine;

/// Everything the daemon needs to start.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub socket_path: PathBuf,
    pub timer: CoachConfig,
    pub provider: ChatProvider,
    /// Use desktop notifications instead of the terminal
    pub desktop_notifications: bool,
    pub speak_cmd: Option<String>,
    pub voice: Option<String>,
    pub listen_cmd: Option<String>,
}

/// Collaborators injected into the daemon.
pub struct Collaborators {
    pub backend: Arc<dyn ChatBackend>,
    pub speech: Arc<dyn SpeechCapability>,
    pub notifier: Arc<dyn NotificationSender>,
}

impl Collaborators {
    /// Builds the real collaborators described by the configuration.
    ///
    /// With desktop notifications on, this shows the confirmation
    /// notification before the daemon starts serving.
    pub async fn from_config(config: &DaemonConfig) -> Self {
        let settings = ChatSettings::from_env(config.provider);
        if !settings.is_configured() {
            warn!(
                provider = %config.provider,
                key_var = %config.provider.api_key_var(),
                "No API key configured, chat requests will fail"
            );
        }

        let speech: Arc<dyn SpeechCapability> =
            if config.speak_cmd.is_some() || config.listen_cmd.is_some() {
                let mut speech =
                    CommandSpeech::new(config.speak_cmd.as_deref(), config.listen_cmd.as_deref());
                if let Some(voice) = &config.voice {
                    speech = speech.with_voice(voice);
                }
                Arc::new(speech)
            } else {
                Arc::new(UnsupportedSpeech)
            };

        Self {
            backend: Arc::new(OpenAiCompatibleBackend::new(settings)),
            speech,
            notifier: notification::select_sender(config.desktop_notifications).await,
        }
    }
}

/// Runs the daemon until SIGINT or SIGTERM.
pub async fn run(config: DaemonConfig) -> Result<()> {
    config.timer.validate().map_err(anyhow::Error::msg)?;

    let collaborators = Collaborators::from_config(&config).await;
    let server = IpcServer::new(&config.socket_path)?;

    info!(
        focus_seconds = config.timer.focus_seconds,
        break_seconds = config.timer.break_seconds,
        provider = %config.provider,
        "Daemon started"
    );

    serve(server, &config.timer, collaborators, shutdown_signal()).await
}

/// Serves IPC requests until `shutdown` completes.
pub async fn serve<F>(
    server: IpcServer,
    timer_config: &CoachConfig,
    collaborators: Collaborators,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()>,
{
    let break_minutes = timer_config.break_minutes();

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (service, timer) = TimerService::new(TimerEngine::new(timer_config, event_tx));

    let (prompt_tx, prompt_rx) = mpsc::unbounded_channel();
    let mut bridge = EventBridge::new(event_rx);
    bridge
        .attach(BreakNotifier::new(collaborators.notifier, break_minutes))
        .attach(BreakPromptInjector::new(prompt_tx, break_minutes));

    let coach = Arc::new(Coach::new(
        collaborators.backend,
        collaborators.speech,
        timer.subscribe(),
    ));

    let service_task = tokio::spawn(service.run());
    let bridge_task = tokio::spawn(bridge.run());
    let prompt_task = {
        let coach = Arc::clone(&coach);
        tokio::spawn(async move { coach.run_prompt_queue(prompt_rx).await })
    };

    let handler = Arc::new(RequestHandler::new(timer.clone(), coach));

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            accepted = server.accept() => match accepted {
                Ok(stream) => {
                    let handler = Arc::clone(&handler);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, handler).await {
                            debug!(error = %e, "Connection ended with an error");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "Failed to accept connection"),
            }
        }
    }

    // Stopping the service drops the engine, which closes the event channel
    // and in turn the bridge and the prompt queue.
    timer.shutdown();
    service_task.await.context("Timer service panicked")?;
    bridge_task.await.context("Event bridge panicked")?;
    prompt_task.abort();

    info!("Daemon stopped");
    Ok(())
}

/// Completes on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT"),
        () = terminate => info!("Received SIGTERM"),
    }
}
