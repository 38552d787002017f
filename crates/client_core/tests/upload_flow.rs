use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use anyhow::{anyhow, Result};
use axum::{
    body::Bytes, extract::State, http::StatusCode, response::IntoResponse, routing::post, Json,
    Router,
};
use client_core::{
    CaptionService, Completion, HttpCaptionClient, MessageSlot, PreviewHost, SelectedFile,
    SubmitOutcome, UploadController, GENERIC_FAILURE_MESSAGE, MISSING_FILE_MESSAGE,
};
use shared::{
    domain::RequestState,
    error::ApiError,
    protocol::{CaptionResponse, GENERATE_CAPTION_PATH},
};
use tokio::net::TcpListener;

/// Handles are in-memory byte blobs; previews are just counted.
#[derive(Default)]
struct MemoryHost {
    live_previews: usize,
}

impl PreviewHost for MemoryHost {
    type Handle = (&'static str, Vec<u8>);
    type Preview = ();

    fn acquire_file(&mut self, handle: &Self::Handle) -> Result<SelectedFile> {
        let (name, bytes) = handle;
        if bytes.is_empty() {
            return Err(anyhow!("{name} is empty"));
        }
        Ok(SelectedFile {
            name: name.to_string(),
            mime_type: Some("image/png".to_string()),
            bytes: bytes.clone(),
        })
    }

    fn create_preview(&mut self, _file: &SelectedFile) -> Result<()> {
        self.live_previews += 1;
        Ok(())
    }

    fn revoke_preview(&mut self, _preview: ()) {
        self.live_previews -= 1;
    }
}

#[derive(Clone)]
struct CountingState {
    hits: Arc<AtomicUsize>,
    fail: bool,
}

async fn generate_caption(State(state): State<CountingState>, body: Bytes) -> axum::response::Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    assert!(!body.is_empty());
    if state.fail {
        return (StatusCode::BAD_REQUEST, Json(ApiError::new("No file uploaded"))).into_response();
    }
    Json(CaptionResponse {
        caption: "a dog running".to_string(),
    })
    .into_response()
}

async fn spawn_server(fail: bool) -> (String, Arc<AtomicUsize>) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(GENERATE_CAPTION_PATH, post(generate_caption))
        .with_state(CountingState {
            hits: hits.clone(),
            fail,
        });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), hits)
}

async fn run_submission(
    controller: &mut UploadController<MemoryHost>,
    service: &dyn CaptionService,
) -> Option<Completion> {
    match controller.submit() {
        SubmitOutcome::Dispatched(job) => {
            assert_eq!(controller.state(), RequestState::Submitting);
            let result = service.generate_caption(job.upload).await;
            Some(controller.complete(job.seq, result))
        }
        _ => None,
    }
}

#[tokio::test]
async fn select_then_submit_yields_caption_from_endpoint() {
    let (base_url, hits) = spawn_server(false).await;
    let client = HttpCaptionClient::new(&base_url).expect("client");
    let mut controller = UploadController::new(MemoryHost::default());

    controller
        .select_file(Some(&("dog.png", b"png-bytes".to_vec())))
        .expect("select");
    let completion = run_submission(&mut controller, &client).await;

    assert_eq!(completion, Some(Completion::Applied(RequestState::Succeeded)));
    assert_eq!(controller.message(), MessageSlot::Caption("a dog running"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(controller.host().live_previews, 1);
}

#[tokio::test]
async fn submit_without_selection_never_reaches_endpoint() {
    let (base_url, hits) = spawn_server(false).await;
    let client = HttpCaptionClient::new(&base_url).expect("client");
    let mut controller = UploadController::new(MemoryHost::default());

    assert!(run_submission(&mut controller, &client).await.is_none());
    assert_eq!(controller.error_message(), Some(MISSING_FILE_MESSAGE));
    assert_eq!(controller.state(), RequestState::Idle);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn rejected_upload_fails_and_allows_retry() {
    let (base_url, hits) = spawn_server(true).await;
    let client = HttpCaptionClient::new(&base_url).expect("client");
    let mut controller = UploadController::new(MemoryHost::default());
    controller
        .select_file(Some(&("dog.png", b"png-bytes".to_vec())))
        .expect("select");

    let completion = run_submission(&mut controller, &client).await;
    assert_eq!(completion, Some(Completion::Applied(RequestState::Failed)));
    assert_eq!(controller.message(), MessageSlot::Error(GENERIC_FAILURE_MESSAGE));
    assert!(controller.can_submit());

    run_submission(&mut controller, &client).await;
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
