// src/services/downloader.rs

//! Document download with validation and bounded retry.
//!
//! Each attempt exclusively creates the destination file and holds it in a
//! guard that deletes it unless the content validated. A rejected attempt,
//! a transport error or a dropped future therefore never leaves a partial
//! file behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{AppError, RejectReason, Result, TerminalFailure};
use crate::models::{AcquisitionResult, DownloadConfig, ResolvedLink};
use crate::utils::{Deadline, Fetcher};

/// Outcome of one failed attempt.
enum AttemptError {
    /// Worth retrying
    Rejected(RejectReason),
    /// Ends the download immediately
    Fatal(AppError),
}

/// An attempt that passed validation.
struct Verified {
    size_bytes: u64,
    sha256: String,
}

/// Hashes everything written through it.
struct DigestWriter<'w> {
    inner: &'w mut File,
    hasher: Sha256,
}

impl<'w> DigestWriter<'w> {
    fn new(inner: &'w mut File) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl AsyncWrite for DigestWriter<'_> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut *this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = polled {
            this.hasher.update(&buf[..n]);
        }
        polled
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut *self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut *self.get_mut().inner).poll_shutdown(cx)
    }
}

/// A destination file owned by the attempt writing it.
struct PartialFile {
    path: PathBuf,
    file: Option<File>,
    persisted: bool,
}

impl PartialFile {
    /// Create `path`, failing if anything already exists there.
    async fn create(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            persisted: false,
        })
    }

    fn writer(&mut self) -> std::io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| std::io::Error::other("partial file already closed"))
    }

    /// Flush and release the handle so the content can be validated.
    async fn close(&mut self) -> std::io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        Ok(())
    }

    fn persist(mut self) {
        self.persisted = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.persisted {
            return;
        }
        drop(self.file.take());
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed rejected download {}", self.path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Could not remove {}: {}", self.path.display(), e),
        }
    }
}

/// Fetches a document to disk and checks it is the real thing.
pub struct AcquisitionDownloader<'a> {
    fetcher: &'a dyn Fetcher,
    config: &'a DownloadConfig,
    timeout: Duration,
}

impl<'a> AcquisitionDownloader<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, config: &'a DownloadConfig, timeout: Duration) -> Self {
        Self {
            fetcher,
            config,
            timeout,
        }
    }

    /// Download `link.direct` to `dest`, sending `referer`.
    ///
    /// Makes at most `max_retries + 1` attempts with a fixed pause between
    /// them. Exhausting them yields [`TerminalFailure::ValidationFailure`]
    /// carrying the last rejection reason.
    pub async fn download(
        &self,
        link: &ResolvedLink,
        referer: &str,
        dest: &Path,
        deadline: Deadline,
    ) -> Result<AcquisitionResult> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        remove_stale(dest).await?;

        let max_attempts = self.config.max_attempts();
        let backoff = Duration::from_millis(self.config.retry_backoff_ms);
        let mut last_reason = RejectReason::Missing;

        for attempt in 1..=max_attempts {
            match self.attempt(&link.direct, referer, dest, deadline).await {
                Ok(Verified { size_bytes, sha256 }) => {
                    log::info!(
                        "Saved {} ({} bytes) on attempt {}",
                        dest.display(),
                        size_bytes,
                        attempt
                    );
                    return Ok(AcquisitionResult {
                        source_link_extracted: link.extracted.clone(),
                        source_link_resolved: link.direct.clone(),
                        saved_path: dest.to_path_buf(),
                        attempts: attempt,
                        size_bytes,
                        sha256,
                        downloaded_at: Utc::now(),
                    });
                }
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Rejected(reason)) => {
                    log::warn!(
                        "Download attempt {}/{} rejected: {}",
                        attempt,
                        max_attempts,
                        reason
                    );
                    last_reason = reason;
                }
            }

            if attempt < max_attempts {
                deadline.sleep("download backoff", backoff).await?;
            }
        }

        Err(TerminalFailure::ValidationFailure {
            url: link.direct.clone(),
            attempts: max_attempts,
            reason: last_reason,
        }
        .into())
    }

    async fn attempt(
        &self,
        url: &str,
        referer: &str,
        dest: &Path,
        deadline: Deadline,
    ) -> std::result::Result<Verified, AttemptError> {
        let mut partial = PartialFile::create(dest)
            .await
            .map_err(|e| AttemptError::Fatal(e.into()))?;

        let mut writer = DigestWriter::new(
            partial
                .writer()
                .map_err(|e| AttemptError::Fatal(e.into()))?,
        );
        let fetched = deadline
            .run(
                "document download",
                self.fetcher
                    .download_to(url, referer, &mut writer, self.timeout),
            )
            .await;
        match fetched {
            Ok(bytes) => log::debug!("Fetched {} bytes from {}", bytes, url),
            Err(e @ AppError::DeadlineExceeded(_)) => return Err(AttemptError::Fatal(e)),
            Err(e) => return Err(AttemptError::Rejected(RejectReason::Network(e.to_string()))),
        }
        // The digest covers exactly the bytes written to the fresh file.
        let sha256 = writer.finish();

        partial
            .close()
            .await
            .map_err(|e| AttemptError::Rejected(RejectReason::Network(e.to_string())))?;

        let size_bytes = self.validate(dest).await.map_err(AttemptError::Rejected)?;
        partial.persist();
        Ok(Verified { size_bytes, sha256 })
    }

    /// Check existence, minimum size and magic signature.
    async fn validate(&self, path: &Path) -> std::result::Result<u64, RejectReason> {
        let size = match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Err(RejectReason::Missing),
        };
        if size < self.config.min_size_bytes {
            return Err(RejectReason::TooSmall {
                size,
                min: self.config.min_size_bytes,
            });
        }

        let magic = self.config.magic.as_bytes();
        let file = File::open(path).await.map_err(|_| RejectReason::Missing)?;
        let mut header = Vec::with_capacity(magic.len());
        file.take(magic.len() as u64)
            .read_to_end(&mut header)
            .await
            .map_err(|e| RejectReason::Network(e.to_string()))?;
        if header != magic {
            return Err(RejectReason::BadSignature { found: header });
        }
        Ok(size)
    }
}

/// Clear whatever an earlier run left at `dest`.
async fn remove_stale(dest: &Path) -> Result<()> {
    match tokio::fs::remove_file(dest).await {
        Ok(()) => {
            log::info!("Replacing existing file {}", dest.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mock::{MockDownload, MockFetcher, valid_document};

    fn config() -> DownloadConfig {
        DownloadConfig {
            retry_backoff_ms: 0,
            ..DownloadConfig::default()
        }
    }

    fn link() -> ResolvedLink {
        ResolvedLink {
            extracted: "https://www.sebi.gov.in/web/?file=https://www.sebi.gov.in/a.pdf".into(),
            direct: "https://www.sebi.gov.in/a.pdf".into(),
        }
    }

    fn files_in(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    const REFERER: &str = "https://www.sebi.gov.in/filings/public-issues/a.html";

    #[tokio::test]
    async fn test_succeeds_on_third_attempt_after_small_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("awfis.pdf");
        let mock = MockFetcher::new()
            .push_download(MockDownload::Bytes(b"<html>blocked</html>".to_vec()))
            .push_download(MockDownload::Bytes(b"%PDF-1.4 truncated".to_vec()))
            .push_download(MockDownload::Bytes(valid_document(60 * 1024)));
        let config = config();
        let downloader = AcquisitionDownloader::new(&mock, &config, Duration::from_secs(5));

        let result = downloader
            .download(&link(), REFERER, &dest, Deadline::none())
            .await
            .unwrap();

        assert_eq!(result.attempts, 3);
        assert_eq!(mock.download_count(), 3);
        assert_eq!(result.size_bytes, 60 * 1024);
        assert_eq!(result.saved_path, dest);
        assert_eq!(result.sha256.len(), 64);
        // Each attempt creates the file exclusively, so attempt 3 could only
        // succeed if both rejected files had been deleted.
        assert_eq!(files_in(dir.path()), vec![dest.clone()]);
    }

    #[tokio::test]
    async fn test_digest_matches_saved_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("digest.pdf");
        let mock = MockFetcher::new()
            .push_download(MockDownload::Bytes(b"short".to_vec()))
            .push_download(MockDownload::Bytes(valid_document(52 * 1024)));
        let config = config();
        let result = AcquisitionDownloader::new(&mock, &config, Duration::from_secs(5))
            .download(&link(), REFERER, &dest, Deadline::none())
            .await
            .unwrap();

        let saved = std::fs::read(&dest).unwrap();
        assert_eq!(result.sha256, hex::encode(Sha256::digest(&saved)));
        assert_eq!(
            result.sha256,
            hex::encode(Sha256::digest(valid_document(52 * 1024)))
        );
    }

    #[tokio::test]
    async fn test_digest_writer_hashes_passthrough() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = File::create(dir.path().join("w.bin")).await.unwrap();
        let mut writer = DigestWriter::new(&mut file);
        writer.write_all(b"abc").await.unwrap();
        writer.flush().await.unwrap();
        assert_eq!(
            writer.finish(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(std::fs::read(dir.path().join("w.bin")).unwrap(), b"abc");
    }

    #[tokio::test]
    async fn test_referer_is_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("x.pdf");
        let mock = MockFetcher::new().push_download(MockDownload::Bytes(valid_document(51200)));
        let config = config();
        AcquisitionDownloader::new(&mock, &config, Duration::from_secs(5))
            .download(&link(), REFERER, &dest, Deadline::none())
            .await
            .unwrap();

        assert_eq!(
            mock.requests(),
            vec![crate::utils::mock::MockRequest::Download {
                url: "https://www.sebi.gov.in/a.pdf".into(),
                referer: REFERER.into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_exhausted_attempts_leave_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("bad.pdf");
        let mut padded_html = b"<!DOCTYPE html>".to_vec();
        padded_html.resize(80 * 1024, b' ');
        let mut mock = MockFetcher::new();
        for _ in 0..4 {
            mock = mock.push_download(MockDownload::Bytes(padded_html.clone()));
        }
        let config = config();
        let err = AcquisitionDownloader::new(&mock, &config, Duration::from_secs(5))
            .download(&link(), REFERER, &dest, Deadline::none())
            .await
            .unwrap_err();

        match err.terminal() {
            Some(TerminalFailure::ValidationFailure {
                attempts, reason, ..
            }) => {
                assert_eq!(*attempts, 4);
                assert!(matches!(reason, RejectReason::BadSignature { found } if found == b"<!DO"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(mock.download_count(), 4);
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_network_error_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("n.pdf");
        let mock = MockFetcher::new()
            .push_download(MockDownload::Fail("connection reset".into()))
            .push_download(MockDownload::Bytes(valid_document(51200)));
        let config = config();
        let result = AcquisitionDownloader::new(&mock, &config, Duration::from_secs(5))
            .download(&link(), REFERER, &dest, Deadline::none())
            .await
            .unwrap();
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test]
    async fn test_last_reason_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("r.pdf");
        let mock = MockFetcher::new()
            .push_download(MockDownload::Bytes(b"tiny".to_vec()))
            .push_download(MockDownload::Fail("timed out".into()));
        let config = DownloadConfig {
            max_retries: 1,
            ..config()
        };
        let err = AcquisitionDownloader::new(&mock, &config, Duration::from_secs(5))
            .download(&link(), REFERER, &dest, Deadline::none())
            .await
            .unwrap_err();
        assert!(matches!(
            err.terminal(),
            Some(TerminalFailure::ValidationFailure {
                attempts: 2,
                reason: RejectReason::Network(_),
                ..
            })
        ));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_stale_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("stale.pdf");
        std::fs::write(&dest, b"old").unwrap();
        let mock = MockFetcher::new().push_download(MockDownload::Bytes(valid_document(51200)));
        let config = config();
        AcquisitionDownloader::new(&mock, &config, Duration::from_secs(5))
            .download(&link(), REFERER, &dest, Deadline::none())
            .await
            .unwrap();
        assert_eq!(std::fs::metadata(&dest).unwrap().len(), 51200);
    }

    #[tokio::test]
    async fn test_expired_deadline_is_fatal_and_clean() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("d.pdf");
        let mock = MockFetcher::new().push_download(MockDownload::Bytes(valid_document(51200)));
        let config = config();
        let err = AcquisitionDownloader::new(&mock, &config, Duration::from_secs(5))
            .download(&link(), REFERER, &dest, Deadline::after(Duration::ZERO))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DeadlineExceeded(_)));
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_partial_file_guard() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.pdf");

        let mut partial = PartialFile::create(&path).await.unwrap();
        partial.writer().unwrap().write_all(b"half").await.unwrap();
        drop(partial);
        assert!(!path.exists());

        let mut partial = PartialFile::create(&path).await.unwrap();
        partial.writer().unwrap().write_all(b"whole").await.unwrap();
        partial.close().await.unwrap();
        partial.persist();
        assert_eq!(std::fs::read(&path).unwrap(), b"whole");

        assert!(PartialFile::create(&path).await.is_err());
    }
}
