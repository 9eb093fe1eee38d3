//! HTTPS retrieval with an ordered transport fallback chain.
//!
//! Every call re-fetches: there is no cache and no automatic retry. Each
//! available transport is tried once, in order, and the first success wins.
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde::de::DeserializeOwned;

use crate::error::FetchError;
use crate::exec::{self, Executor, ps_quote};
use crate::platform::Platform;

/// `User-Agent` sent by the direct client (GitHub's API rejects requests
/// without one).
pub const USER_AGENT: &str = concat!("profile-bootstrap/", env!("CARGO_PKG_VERSION"));

/// One way of downloading a URL to a file.
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Short name used in failure reports.
    fn name(&self) -> &'static str;

    /// Whether the transport can be used in this environment.
    fn is_available(&self) -> bool;

    /// Background transfers need a `Content-Length` and cannot fetch
    /// generated documents such as API responses.
    fn is_background(&self) -> bool {
        false
    }

    /// Download `url` to `dest`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails for any reason.
    fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Resumable background transfer through BITS (`Start-BitsTransfer`).
#[derive(Debug)]
pub struct BitsTransport {
    executor: Arc<dyn Executor>,
    available: bool,
}

impl BitsTransport {
    /// BITS is available on Windows when the system PowerShell host is.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>, platform: &Platform) -> Self {
        let available = platform.is_windows() && executor.which(exec::system_powershell());
        Self {
            executor,
            available,
        }
    }
}

impl Transport for BitsTransport {
    fn name(&self) -> &'static str {
        "bits"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn is_background(&self) -> bool {
        true
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let script = format!(
            "$ErrorActionPreference = 'Stop'; Start-BitsTransfer -Source {} -Destination {}",
            ps_quote(url),
            ps_quote(&dest.to_string_lossy())
        );
        exec::run_powershell_checked(&*self.executor, exec::system_powershell(), &script)?;
        Ok(())
    }
}

/// Direct HTTPS client.
///
/// `ureq` negotiates TLS through rustls, which only speaks TLS 1.2 and 1.3.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpTransport;

impl Transport for HttpTransport {
    fn name(&self) -> &'static str {
        "https"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = ureq::get(url)
            .header("User-Agent", USER_AGENT)
            .call()
            .with_context(|| format!("GET {url}"))?;
        let mut file =
            File::create(dest).with_context(|| format!("creating {}", dest.display()))?;
        let copied = io::copy(&mut response.body_mut().as_reader(), &mut file);
        if let Err(e) = copied {
            drop(file);
            std::fs::remove_file(dest).ok();
            return Err(e).with_context(|| format!("reading body of {url}"));
        }
        Ok(())
    }
}

/// Ordered transport chain.
#[derive(Debug)]
pub struct Fetcher {
    transports: Vec<Box<dyn Transport>>,
}

impl Fetcher {
    /// BITS first, then the direct client.
    #[must_use]
    pub fn system(executor: Arc<dyn Executor>, platform: &Platform) -> Self {
        Self::with_transports(vec![
            Box::new(BitsTransport::new(executor, platform)),
            Box::new(HttpTransport),
        ])
    }

    /// Build a fetcher over an explicit transport chain.
    #[must_use]
    pub fn with_transports(transports: Vec<Box<dyn Transport>>) -> Self {
        Self { transports }
    }

    /// Download `url` to `dest`, falling back through the transport chain.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NoTransport`] if no transport is available, or
    /// [`FetchError::AllTransportsFailed`] listing every attempt.
    pub fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.fetch_with(url, dest, |_| true)
    }

    /// Retrieve and parse a JSON document with the direct transports.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails or the body is not valid JSON
    /// for `T`.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let scratch = tempfile::tempdir().context("creating scratch directory")?;
        let path = scratch.path().join("document.json");
        self.fetch_with(url, &path, |t| !t.is_background())?;
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading response from {url}"))?;
        serde_json::from_str(&text).with_context(|| format!("parsing JSON from {url}"))
    }

    fn fetch_with(
        &self,
        url: &str,
        dest: &Path,
        allowed: impl Fn(&dyn Transport) -> bool,
    ) -> Result<(), FetchError> {
        let mut attempts = Vec::new();
        for transport in &self.transports {
            if !allowed(transport.as_ref()) || !transport.is_available() {
                continue;
            }
            match transport.download(url, dest) {
                Ok(()) => return Ok(()),
                Err(e) => attempts.push(format!("{}: {e:#}", transport.name())),
            }
        }
        if attempts.is_empty() {
            Err(FetchError::NoTransport {
                url: url.to_string(),
            })
        } else {
            Err(FetchError::AllTransportsFailed {
                url: url.to_string(),
                attempts,
            })
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::platform::Os;
    use crate::resources::test_helpers::MockExecutor;

    /// Transport writing fixed content, or failing.
    #[derive(Debug)]
    struct FakeTransport {
        name: &'static str,
        available: bool,
        background: bool,
        body: Option<&'static str>,
    }

    impl FakeTransport {
        fn ok(name: &'static str, body: &'static str) -> Self {
            Self {
                name,
                available: true,
                background: false,
                body: Some(body),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                body: None,
                ..Self::ok(name, "")
            }
        }
    }

    impl Transport for FakeTransport {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn is_background(&self) -> bool {
            self.background
        }

        fn download(&self, _url: &str, dest: &Path) -> Result<()> {
            match self.body {
                Some(body) => Ok(std::fs::write(dest, body)?),
                None => anyhow::bail!("connection reset"),
            }
        }
    }

    #[test]
    fn first_transport_wins() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a");
        let fetcher = Fetcher::with_transports(vec![
            Box::new(FakeTransport::ok("one", "1")),
            Box::new(FakeTransport::ok("two", "2")),
        ]);
        fetcher.fetch("https://example.com/a", &dest).unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "1");
    }

    #[test]
    fn falls_back_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a");
        let fetcher = Fetcher::with_transports(vec![
            Box::new(FakeTransport::failing("bits")),
            Box::new(FakeTransport::ok("https", "body")),
        ]);
        fetcher.fetch("https://example.com/a", &dest).unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "body");
    }

    #[test]
    fn all_failures_are_listed_once_each() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Fetcher::with_transports(vec![
            Box::new(FakeTransport::failing("bits")),
            Box::new(FakeTransport::failing("https")),
        ]);
        let err = fetcher
            .fetch("https://example.com/a", &dir.path().join("a"))
            .unwrap_err();
        match err {
            FetchError::AllTransportsFailed { attempts, .. } => {
                assert_eq!(attempts.len(), 2);
                assert!(attempts[0].starts_with("bits: "));
                assert!(attempts[1].starts_with("https: "));
            }
            FetchError::NoTransport { .. } => panic!("expected AllTransportsFailed"),
        }
    }

    #[test]
    fn unavailable_transports_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut bits = FakeTransport::ok("bits", "x");
        bits.available = false;
        let fetcher = Fetcher::with_transports(vec![Box::new(bits)]);
        let err = fetcher
            .fetch("https://example.com/a", &dir.path().join("a"))
            .unwrap_err();
        assert!(matches!(err, FetchError::NoTransport { .. }));
    }

    #[derive(Debug, serde::Deserialize)]
    struct Release {
        tag_name: String,
    }

    #[test]
    fn get_json_skips_background_transports() {
        let mut bits = FakeTransport::ok("bits", "not json");
        bits.background = true;
        let fetcher = Fetcher::with_transports(vec![
            Box::new(bits),
            Box::new(FakeTransport::ok("https", r#"{"tag_name":"v3.2.1"}"#)),
        ]);
        let release: Release = fetcher.get_json("https://api.example.com/latest").unwrap();
        assert_eq!(release.tag_name, "v3.2.1");
    }

    #[test]
    fn get_json_reports_parse_errors() {
        let fetcher =
            Fetcher::with_transports(vec![Box::new(FakeTransport::ok("https", "<html>"))]);
        let err = fetcher
            .get_json::<Release>("https://api.example.com/latest")
            .unwrap_err();
        assert!(format!("{err:#}").contains("parsing JSON"));
    }

    #[test]
    fn bits_unavailable_off_windows() {
        let executor: Arc<dyn Executor> = Arc::new(MockExecutor::fail().with_which(true));
        let bits = BitsTransport::new(executor, &Platform::new(Os::Linux, "/home/u"));
        assert!(!bits.is_available());
    }

    #[test]
    fn bits_uses_start_bits_transfer() {
        let executor = Arc::new(MockExecutor::ok("").with_which(true));
        let bits = BitsTransport::new(
            Arc::clone(&executor) as Arc<dyn Executor>,
            &Platform::new(Os::Windows, "/u"),
        );
        assert!(bits.is_available());
        bits.download("https://example.com/a.zip", Path::new("/tmp/a.zip"))
            .unwrap();
        assert!(executor.scripts()[0].contains(
            "Start-BitsTransfer -Source 'https://example.com/a.zip' -Destination '/tmp/a.zip'"
        ));
    }
}
