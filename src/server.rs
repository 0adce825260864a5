//! Single-page upload form over HTTP.
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/` | GET | Upload form |
//! | `/generate` | POST | Multipart field `file`: run the pipeline, show the summary |
//! | `/download` | GET | The most recently generated document |
//! | `/health` | GET | Liveness check |
//!
//! Runs are serialised behind one lock and share fixed paths under the work
//! directory: uploads land in `input/<file name>`, the document in
//! `output/Lessons_Learned_Summary.docx`. The last run wins.

use crate::config::GenerationConfig;
use crate::convert::generate;
use crate::docx::DOCX_MIME;
use crate::error::{ErrorCategory, Pptx2DocxError};
use crate::output::GenerationOutput;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use quick_xml::escape::escape;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info};

/// File name offered to the browser for the generated document.
pub const DOWNLOAD_NAME: &str = "Lessons_Learned_Summary.docx";

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<ServerState>,
}

struct ServerState {
    config: GenerationConfig,
    work_dir: PathBuf,
    run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: GenerationConfig, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(ServerState {
                config,
                work_dir: work_dir.into(),
                run_lock: Mutex::new(()),
            }),
        }
    }

    fn input_dir(&self) -> PathBuf {
        self.inner.work_dir.join("input")
    }

    fn output_path(&self) -> PathBuf {
        self.inner.work_dir.join("output").join(DOWNLOAD_NAME)
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/generate", post(generate_handler))
        .route("/download", get(download))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Serving upload form on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn index() -> Html<String> {
    Html(page(""))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn generate_handler(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut upload: Option<(String, Vec<u8>)> = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return error_page(StatusCode::BAD_REQUEST, &format!("Malformed upload: {e}")),
        };
        if field.name() != Some("file") {
            continue;
        }
        let file_name = safe_file_name(field.file_name());
        match field.bytes().await {
            Ok(data) => upload = Some((file_name, data.to_vec())),
            Err(e) => return error_page(StatusCode::BAD_REQUEST, &format!("Malformed upload: {e}")),
        }
    }

    let Some((file_name, data)) = upload.filter(|(_, data)| !data.is_empty()) else {
        return error_page(StatusCode::BAD_REQUEST, "Please choose a .pptx file to upload.");
    };

    let _guard = state.inner.run_lock.lock().await;

    let input_path = state.input_dir().join(&file_name);
    if let Err(e) = save_upload(&input_path, &data).await {
        error!("Failed to store upload '{}': {}", input_path.display(), e);
        return error_page(StatusCode::INTERNAL_SERVER_ERROR, "Could not store the upload.");
    }
    info!("Received '{}' ({} bytes)", file_name, data.len());

    let input = input_path.to_string_lossy().to_string();
    match generate(&input, state.output_path(), &state.inner.config).await {
        Ok(output) => Html(result_page(&output)).into_response(),
        Err(e) => {
            error!("Generation failed for '{}': {}", file_name, e);
            error_page(status_for(&e), e.user_message())
        }
    }
}

async fn download(State(state): State<AppState>) -> Response {
    let path = state.output_path();
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(_) => return error_page(StatusCode::NOT_FOUND, "No document has been generated yet."),
    };

    let headers = [
        (header::CONTENT_TYPE, DOCX_MIME.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", DOWNLOAD_NAME),
        ),
    ];
    (headers, data).into_response()
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Final path component of the client-supplied name, or a fixed fallback.
fn safe_file_name(name: Option<&str>) -> String {
    name.and_then(|n| Path::new(n).file_name())
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty() && *n != "..")
        .unwrap_or("upload.pptx")
        .to_string()
}

async fn save_upload(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await
}

fn status_for(e: &Pptx2DocxError) -> StatusCode {
    match e.category() {
        ErrorCategory::Input => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCategory::Summary => StatusCode::BAD_GATEWAY,
        ErrorCategory::Template | ErrorCategory::Output | ErrorCategory::Other => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_page(status: StatusCode, message: &str) -> Response {
    let body = format!(r#"<p class="error">{}</p>"#, escape(message));
    (status, Html(page(&body))).into_response()
}

fn result_page(output: &GenerationOutput) -> String {
    let mut body = String::from(r#"<h2>Generated Summary</h2>"#);
    body.push_str(&format!(
        r#"<textarea readonly rows="20" cols="100">{}</textarea>"#,
        escape(&output.reply)
    ));
    if let Some(ref report) = output.template {
        if !report.missing.is_empty() {
            body.push_str(&format!(
                r#"<p class="warning">Template has no paragraph for: {}</p>"#,
                escape(&report.missing.join(", "))
            ));
        }
    }
    body.push_str(&format!(
        r#"<p><a href="/download">Download {}</a></p>"#,
        DOWNLOAD_NAME
    ));
    page(&body)
}

fn page(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Serious Event Lessons Learned Generator</title></head>
<body>
<h1>Serious Event Lessons Learned Generator</h1>
<form action="/generate" method="post" enctype="multipart/form-data">
<label>Upload a PowerPoint file <input type="file" name="file" accept=".pptx"></label>
<button type="submit">Generate</button>
</form>
{body}
</body>
</html>
"#
    )
}
