//! Caption worker thread: owns the tokio runtime and the HTTP client.

use std::{sync::Arc, thread};

use client_core::{CaptionService, HttpCaptionClient};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::config::Settings;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: &Settings) {
    let endpoint_url = settings.endpoint_url.clone();
    let timeout = settings.request_timeout();

    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Caption worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build caption worker runtime: {err}");
                return;
            }
        };

        let client = match HttpCaptionClient::with_timeout(&endpoint_url, timeout) {
            Ok(client) => client,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("{err:#}"),
                )));
                tracing::error!(endpoint = %endpoint_url, "failed to build caption client: {err:#}");
                return;
            }
        };
        tracing::info!(endpoint = %client.endpoint(), ?timeout, "caption worker ready");
        let _ = ui_tx.try_send(UiEvent::Info(format!(
            "Ready. Captions from {}",
            client.endpoint()
        )));

        runtime.block_on(serve_commands(Arc::new(client), cmd_rx, ui_tx));
    });
}

/// Runs until the UI side of the command queue is dropped. Every job gets its
/// own task so a slow request never holds up a newer one.
pub async fn serve_commands(
    service: Arc<dyn CaptionService>,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::GenerateCaption { seq, upload } => {
                let service = Arc::clone(&service);
                let ui_tx = ui_tx.clone();
                tokio::spawn(async move {
                    let result = service.generate_caption(upload).await;
                    // Blocking send: a dropped completion would leave the trigger disabled.
                    if ui_tx.send(UiEvent::CaptionFinished { seq, result }).is_err() {
                        tracing::debug!(seq = seq.0, "ui closed before caption result arrived");
                    }
                });
            }
        }
    }
    tracing::info!("ui command queue closed; caption worker stopping");
}
