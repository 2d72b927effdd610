use std::io::BufReader;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::ServiceConfig;
use crate::error::{LogShieldError, Result};
use crate::model::ScanResponse;

/// Longest error body carried into a `Status` error.
const MAX_ERROR_BODY: usize = 200;

/// Blocking HTTP client for the scanning service.
///
/// Uploads as `multipart/form-data` with a single `file` part.
pub struct HttpScanService {
    agent: ureq::Agent,
    root_url: Url,
    scan_url: Url,
    max_upload_bytes: Option<u64>,
}

#[derive(Deserialize)]
struct HealthReply {
    message: Option<String>,
}

impl HttpScanService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let root_url = Url::parse(&config.endpoint).map_err(|e| {
            LogShieldError::Config(format!("invalid service endpoint '{}': {e}", config.endpoint))
        })?;
        let scan_url = scan_url(&root_url, &config.scan_path)?;
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();

        Ok(Self {
            agent,
            root_url,
            scan_url,
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    pub fn scan_url(&self) -> &Url {
        &self.scan_url
    }
}

/// Resolve `scan_path` under the endpoint, keeping any path prefix the
/// endpoint carries (`http://host/logshield` + `/scan` is `/logshield/scan`).
fn scan_url(root_url: &Url, scan_path: &str) -> Result<Url> {
    let mut base = root_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(scan_path.trim_start_matches('/'))
        .map_err(|e| LogShieldError::Config(format!("invalid scan path '{scan_path}': {e}")))
}

/// Stream a JSON body. A failed read is a transport failure; a body that
/// arrives but does not parse is a malformed response.
fn read_json<T: DeserializeOwned>(url: &Url, response: ureq::Response) -> Result<T> {
    serde_json::from_reader(BufReader::new(response.into_reader())).map_err(|e| {
        if e.is_io() {
            LogShieldError::Transport {
                endpoint: url.to_string(),
                message: format!("reading response body: {e}"),
            }
        } else {
            LogShieldError::MalformedResponse(e.to_string())
        }
    })
}

fn map_error(url: &Url, err: ureq::Error) -> LogShieldError {
    match err {
        ureq::Error::Status(status, response) => {
            let mut message = response.into_string().unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|&i| message.is_char_boundary(i))
                    .unwrap_or(0);
                message.truncate(cut);
            }
            LogShieldError::Status { status, message }
        }
        ureq::Error::Transport(transport) => LogShieldError::Transport {
            endpoint: url.to_string(),
            message: transport.to_string(),
        },
    }
}

impl super::ScanService for HttpScanService {
    fn submit(&self, file_name: &str, content: &[u8]) -> Result<ScanResponse> {
        if let Some(max) = self.max_upload_bytes {
            if content.len() as u64 > max {
                return Err(LogShieldError::Config(format!(
                    "{file_name} is {} bytes; max_upload_bytes is {max}",
                    content.len()
                )));
            }
        }

        let boundary = format!("logshield-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_body(&boundary, file_name, content);
        tracing::debug!(url = %self.scan_url, bytes = content.len(), "posting log file");

        let response = self
            .agent
            .post(self.scan_url.as_str())
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={boundary}"),
            )
            .send_bytes(&body)
            .map_err(|e| map_error(&self.scan_url, e))?;

        read_json(&self.scan_url, response)
    }

    fn health(&self) -> Result<String> {
        let response = self
            .agent
            .get(self.root_url.as_str())
            .call()
            .map_err(|e| map_error(&self.root_url, e))?;
        let reply: HealthReply = read_json(&self.root_url, response)?;
        Ok(reply.message.unwrap_or_else(|| "ok".into()))
    }
}

/// Encode a single-file `multipart/form-data` body.
fn multipart_body(boundary: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let safe_name: String = file_name
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| if c == '"' { '\'' } else { c })
        .collect();

    let mut body = Vec::with_capacity(content.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{safe_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/plain\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}
