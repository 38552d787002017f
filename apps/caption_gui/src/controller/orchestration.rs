//! Command orchestration helpers from UI actions to the worker command queue.

use client_core::CaptionError;
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues `cmd` for the worker. When the queue cannot take it, the status line
/// explains why and the returned error stands in for the job's result.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> Result<(), CaptionError> {
    let cmd_name = cmd.name();
    tracing::debug!(command = cmd_name, "queueing ui->worker command");

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->worker command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => {
            *status = "Caption queue is full; please retry".to_string();
            tracing::warn!(command = cmd_name, "ui->worker command queue is full");
            Err(CaptionError::WorkerUnavailable("command queue full".to_string()))
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Caption worker disconnected (possible startup/runtime failure); restart the app"
                    .to_string();
            tracing::error!(command = cmd_name, "ui->worker command queue disconnected");
            Err(CaptionError::WorkerUnavailable(
                "command queue disconnected".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::ImageUpload;
    use crossbeam_channel::bounded;
    use shared::domain::RequestSeq;

    fn job(seq: i64) -> BackendCommand {
        BackendCommand::GenerateCaption {
            seq: RequestSeq(seq),
            upload: ImageUpload {
                filename: "dog.jpg".to_string(),
                mime_type: Some("image/jpeg".to_string()),
                bytes: vec![1, 2, 3],
            },
        }
    }

    #[test]
    fn queues_command_when_worker_has_room() {
        let (tx, rx) = bounded(1);
        let mut status = String::new();
        dispatch_backend_command(&tx, job(1), &mut status).expect("queued");
        assert!(status.is_empty());
        assert!(matches!(
            rx.try_recv(),
            Ok(BackendCommand::GenerateCaption { seq: RequestSeq(1), .. })
        ));
    }

    #[test]
    fn full_queue_reports_worker_unavailable() {
        let (tx, _rx) = bounded(1);
        let mut status = String::new();
        dispatch_backend_command(&tx, job(1), &mut status).expect("first fits");
        let err = dispatch_backend_command(&tx, job(2), &mut status).expect_err("full");
        assert!(err.is_transport());
        assert!(status.contains("queue is full"));
    }

    #[test]
    fn disconnected_worker_reports_worker_unavailable() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let mut status = String::new();
        let err = dispatch_backend_command(&tx, job(1), &mut status).expect_err("disconnected");
        assert!(matches!(err, CaptionError::WorkerUnavailable(_)));
        assert!(status.contains("disconnected"));
    }
}
