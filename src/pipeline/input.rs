//! Input resolution: turn a user-supplied path or URL into a local `.pptx`.
//!
//! The extractor needs a seekable file, so URLs are downloaded into a
//! `TempDir` that lives as long as the [`ResolvedInput`]. Either way the first
//! four bytes are sniffed before any parsing: a presentation is a zip package,
//! and the common mistakes (a legacy `.ppt`, a PDF export, an HTML error page
//! saved under the wrong name) are named in the error instead of surfacing as
//! a zip-reader message.

use crate::error::Pptx2DocxError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Local file header signature every OOXML package starts with.
pub const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// Name given to a download when neither the response nor the URL has one.
const FALLBACK_NAME: &str = "downloaded.pptx";

pub enum ResolvedInput {
    Local(PathBuf),
    /// Downloaded deck; the directory is removed when this value is dropped.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a local presentation file.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, Pptx2DocxError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// What a non-presentation file most likely is, judged by its first bytes.
pub fn sniff_format(magic: &[u8; 4]) -> &'static str {
    match magic {
        [b'P', b'K', 3, 4] => "a zip package without presentation parts",
        [0xD0, 0xCF, 0x11, 0xE0] => "a legacy .ppt or other OLE document; save it as .pptx",
        [b'%', b'P', b'D', b'F'] => "a PDF document",
        [b'<', ..] | [0xEF, 0xBB, 0xBF, b'<'] => "an HTML or XML document",
        _ => "unknown data",
    }
}

/// Reject anything whose first four bytes are not [`ZIP_MAGIC`].
///
/// Heads shorter than four bytes pass; the extractor reports them as corrupt.
pub fn check_magic(path: &Path, head: &[u8]) -> Result<(), Pptx2DocxError> {
    match head.get(..4) {
        Some(first) if first != ZIP_MAGIC => {
            let mut magic = [0u8; 4];
            magic.copy_from_slice(first);
            Err(Pptx2DocxError::NotAPresentation {
                path: path.to_path_buf(),
                magic,
            })
        }
        _ => Ok(()),
    }
}

fn resolve_local(path_str: &str) -> Result<ResolvedInput, Pptx2DocxError> {
    let path = PathBuf::from(path_str);
    let head = read_head(&path)?;
    check_magic(&path, &head)?;
    debug!("Resolved local presentation: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Up to the first four bytes of the file at `path`.
fn read_head(path: &Path) -> Result<Vec<u8>, Pptx2DocxError> {
    let unreadable = |e: std::io::Error| match e.kind() {
        std::io::ErrorKind::PermissionDenied => Pptx2DocxError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Pptx2DocxError::FileNotFound {
            path: path.to_path_buf(),
        },
    };

    let file = std::fs::File::open(path).map_err(unreadable)?;
    let mut head = Vec::with_capacity(4);
    file.take(4).read_to_end(&mut head).map_err(unreadable)?;
    Ok(head)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, Pptx2DocxError> {
    info!("Downloading presentation from: {}", url);
    let failed = |reason: String| Pptx2DocxError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            Pptx2DocxError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let disposition = response
        .headers()
        .get(reqwest::header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(filename_from_disposition);
    let filename = pptx_name(disposition.or_else(|| filename_from_url(url)));

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
    check_magic(Path::new(url), &bytes)?;

    let temp_dir = TempDir::new().map_err(|e| Pptx2DocxError::Internal(e.to_string()))?;
    let path = temp_dir.path().join(&filename);
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| Pptx2DocxError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded '{}' ({} bytes)", filename, bytes.len());
    Ok(ResolvedInput::Downloaded {
        path,
        _temp_dir: temp_dir,
    })
}

/// The `filename=` parameter of a `Content-Disposition` header, reduced to
/// its final path component.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|part| part.trim().strip_prefix("filename="))
        .map(|v| v.trim().trim_matches('"'))
        .find_map(|v| Path::new(v).file_name()?.to_str().map(String::from))
        .filter(|v| !v.is_empty())
}

/// Last non-empty path segment of `url`.
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let last = parsed.path_segments()?.next_back()?;
    (!last.is_empty()).then(|| last.to_string())
}

/// `name` with a `.pptx` extension, so the saved deck is recognisable on disk.
fn pptx_name(name: Option<String>) -> String {
    match name {
        Some(n) if n.to_ascii_lowercase().ends_with(".pptx") => n,
        Some(n) => format!("{n}.pptx"),
        None => FALLBACK_NAME.to_string(),
    }
}
