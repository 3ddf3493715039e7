//! HTTP access to the vault

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use super::address::validate_address;
use super::metadata::{CatalogEntry, CatalogMetadata};
use super::page::{parse_listing, parse_page};
use crate::config::DEFAULT_HTTP_TIMEOUT_SECS;
use crate::error::{Result, VaultError};
use crate::logging::log_download;

const USER_AGENT: &str = concat!("NwnVault/", env!("CARGO_PKG_VERSION"));
const READ_CHUNK: usize = 64 * 1024;

/// Blocking vault client with a bounded timeout and a cancellation flag.
///
/// The flag is checked before every request and between body chunks.
#[derive(Clone)]
pub struct CatalogClient {
    agent: ureq::Agent,
    cancel_flag: Arc<AtomicBool>,
}

impl Default for CatalogClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS))
    }
}

impl CatalogClient {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Share an externally owned cancellation flag (e.g. set from a Ctrl+C handler)
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel_flag = flag;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel_flag.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    pub fn check_cancelled(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(VaultError::Cancelled)
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------------
    // Raw fetches
    // ------------------------------------------------------------------------

    /// GET `url` and return the whole body
    pub fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        self.check_cancelled()?;

        let response = self.agent.get(url.as_str()).call().map_err(|e| fetch_error(url, e))?;
        let mut reader = response.into_reader();
        let mut body = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK];

        loop {
            self.check_cancelled()?;
            let read = reader.read(&mut chunk).map_err(|e| VaultError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }

        Ok(body)
    }

    pub fn fetch_text(&self, url: &Url) -> Result<String> {
        let body = self.fetch_bytes(url)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    // ------------------------------------------------------------------------
    // Catalog operations
    // ------------------------------------------------------------------------

    /// Validate `address`, fetch the page and parse its metadata.
    ///
    /// Invalid addresses fail before any request is made.
    pub fn extract(&self, address: &str) -> Result<CatalogMetadata> {
        let url = validate_address(address)?;
        self.extract_from(&url)
    }

    pub fn extract_from(&self, url: &Url) -> Result<CatalogMetadata> {
        log_download(&format!("Fetching catalog page {}", url));
        let html = self.fetch_text(url)?;
        parse_page(&html, url)
    }

    /// Fetch a listing page and collect its project links
    pub fn list(&self, address: &str) -> Result<Vec<CatalogEntry>> {
        let url = validate_address(address)?;
        log_download(&format!("Fetching catalog listing {}", url));
        let html = self.fetch_text(&url)?;
        Ok(parse_listing(&html, &url))
    }

    /// Download the payload a page's metadata points at
    pub fn fetch_payload(&self, metadata: &CatalogMetadata) -> Result<Vec<u8>> {
        let url = validate_address(&metadata.href)?;
        log_download(&format!("Downloading {} from {}", metadata.title, url));
        self.fetch_bytes(&url)
    }
}

fn fetch_error(url: &Url, err: ureq::Error) -> VaultError {
    let reason = match err {
        ureq::Error::Status(code, response) => {
            format!("HTTP {} {}", code, response.status_text())
        }
        ureq::Error::Transport(transport) => transport.to_string(),
    };
    VaultError::Fetch {
        url: url.to_string(),
        reason,
    }
}

/// `extract` with a default client
pub fn extract(address: &str) -> Result<CatalogMetadata> {
    CatalogClient::default().extract(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve `responses` (status line, body) to successive connections
    fn serve(responses: Vec<(&'static str, Vec<u8>)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                    line.clear();
                }
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                stream.write_all(head.as_bytes()).unwrap();
                stream.write_all(&body).unwrap();
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn invalid_address_fails_without_network() {
        let client = CatalogClient::default();
        for address in ["", "google.com", "http://"] {
            assert!(matches!(
                client.extract(address),
                Err(VaultError::InvalidAddress { .. })
            ));
        }
    }

    #[test]
    fn http_error_status_is_a_fetch_error() {
        let base = serve(vec![("404 Not Found", b"gone".to_vec())]);
        let result = CatalogClient::default().extract(&format!("{}/project/missing", base));
        match result {
            Err(VaultError::Fetch { reason, .. }) => assert!(reason.contains("404")),
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    #[test]
    fn refused_connection_is_a_fetch_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = CatalogClient::new(Duration::from_secs(2));
        assert!(matches!(
            client.extract(&format!("http://127.0.0.1:{}/project/x", port)),
            Err(VaultError::Fetch { .. })
        ));
    }

    #[test]
    fn extract_parses_served_page() {
        let page = br#"<a href="/modules/enigma.zip" type="application/zip; length=1048576" title="Enigma Island">Download</a>"#;
        let base = serve(vec![("200 OK", page.to_vec())]);

        let metadata = CatalogClient::default()
            .extract(&format!("{}/project/enigma", base))
            .unwrap();
        assert_eq!(metadata.href, format!("{}/modules/enigma.zip", base));
        assert_eq!(metadata.compression, "zip");
        assert_eq!(metadata.size.as_deref(), Some("1048576"));
        assert_eq!(metadata.title, "Enigma Island");
    }

    #[test]
    fn cancelled_client_makes_no_request() {
        let client = CatalogClient::default();
        client.cancel_flag().store(true, Ordering::Relaxed);
        assert!(matches!(
            client.extract("http://127.0.0.1:9/project/x"),
            Err(VaultError::Cancelled)
        ));
    }
}
