//! Chunked media transfer and export download.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use reqwest::{Method, Response, StatusCode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use stemma_types::ProgressFn;

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};

/// Download chunk size; the progress callback fires once per chunk written.
const DOWNLOAD_CHUNK_SIZE: usize = 1024;

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Result of a media upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    /// The server already holds this file (409); skipped, not an error.
    AlreadyExists,
}

/// Paths produced by [`ApiClient::download_export`]. The caller owns
/// cleanup of both temporaries.
#[derive(Debug, Clone)]
pub struct ExportDownload {
    pub compressed: PathBuf,
    pub decompressed: PathBuf,
}

impl ApiClient<'_> {
    /// Download a media file to `dest`.
    ///
    /// With `anonymous` set, the token rides in the query string instead of
    /// an Authorization header, for direct browser-style fetches.
    pub async fn download_file(
        &mut self,
        handle: &str,
        dest: &Path,
        progress: Option<&ProgressFn>,
        anonymous: bool,
    ) -> ClientResult<()> {
        let mut url = self.endpoint(&format!("media/{handle}/file"))?;
        let resp = if anonymous {
            let token = self.access_token().await?;
            url.query_pairs_mut().append_pair("jwt", &token);
            self.http.get(url).send().await?
        } else {
            self.authed(Method::GET, url, None, None).await?
        };
        if !resp.status().is_success() {
            return Err(Self::unexpected_status(resp).await);
        }
        stream_to_file(resp, dest, progress).await
    }

    /// Upload a media file the server reported as missing. An existing
    /// remote file is a soft skip.
    pub async fn upload_file(
        &mut self,
        handle: &str,
        source: &Path,
        progress: Option<&ProgressFn>,
    ) -> ClientResult<UploadOutcome> {
        let bytes = read_chunked(source, progress).await?;
        match self.upload_once(handle, bytes).await {
            Ok(()) => Ok(UploadOutcome::Uploaded),
            Err(ClientError::Conflict(detail)) => {
                tracing::info!("{}; skipping upload", detail);
                Ok(UploadOutcome::AlreadyExists)
            }
            Err(e) => Err(e),
        }
    }

    async fn upload_once(&mut self, handle: &str, bytes: Bytes) -> ClientResult<()> {
        let url = self.endpoint(&format!("media/{handle}/file?uploadmissing=1"))?;
        let resp = self.authed(Method::PUT, url, None, Some(bytes)).await?;
        match resp.status() {
            StatusCode::CONFLICT => Err(ClientError::Conflict(format!(
                "file for media record {handle} already present"
            ))),
            status if status.is_success() => Ok(()),
            _ => Err(Self::unexpected_status(resp).await),
        }
    }

    /// Download the compressed full-database export to a temporary file and
    /// decompress it alongside. The caller owns cleanup of both paths.
    pub async fn download_export(&mut self) -> ClientResult<ExportDownload> {
        let url = self.endpoint("exporters/gramps/file")?;
        let resp = self.authed(Method::GET, url, None, None).await?;
        if !resp.status().is_success() {
            return Err(Self::unexpected_status(resp).await);
        }

        let compressed = keep_temp(".gramps.gz")?;
        stream_to_file(resp, &compressed, None).await?;

        let decompressed = keep_temp(".gramps")?;
        let mut reader = flate2::read::GzDecoder::new(std::fs::File::open(&compressed)?);
        let mut writer = std::fs::File::create(&decompressed)?;
        std::io::copy(&mut reader, &mut writer)?;

        tracing::info!(
            "Export downloaded to {} and decompressed to {}",
            compressed.display(),
            decompressed.display()
        );
        Ok(ExportDownload { compressed, decompressed })
    }
}

fn keep_temp(suffix: &str) -> ClientResult<PathBuf> {
    tempfile::Builder::new()
        .prefix("stemma-export-")
        .suffix(suffix)
        .tempfile()?
        .into_temp_path()
        .keep()
        .map_err(|e| ClientError::Io(e.error))
}

async fn stream_to_file(
    mut resp: Response,
    dest: &Path,
    progress: Option<&ProgressFn>,
) -> ClientResult<()> {
    let total = resp.content_length();
    let mut file = tokio::fs::File::create(dest).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = resp.chunk().await? {
        for piece in chunk.chunks(DOWNLOAD_CHUNK_SIZE) {
            file.write_all(piece).await?;
            written += piece.len() as u64;
            if let Some(callback) = progress {
                callback(fraction(written, total));
            }
        }
    }
    file.flush().await?;
    Ok(())
}

async fn read_chunked(source: &Path, progress: Option<&ProgressFn>) -> ClientResult<Bytes> {
    let mut file = tokio::fs::File::open(source).await?;
    let total = file.metadata().await?.len();
    let mut data = Vec::with_capacity(total as usize);
    let mut buffer = vec![0u8; UPLOAD_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(callback) = progress {
            callback(fraction(data.len() as u64, Some(total)));
        }
    }
    Ok(Bytes::from(data))
}

fn fraction(done: u64, total: Option<u64>) -> f64 {
    match total {
        Some(total) if total > 0 => done as f64 / total as f64,
        _ => -1.0,
    }
}
