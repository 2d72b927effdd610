pub mod http;

use crate::error::Result;
use crate::model::ScanResponse;

pub use http::HttpScanService;

/// The boundary to the external classifier.
///
/// Implementations send a log file's raw bytes and return the parsed
/// response. They must not keep the content after returning.
pub trait ScanService {
    /// Classify `content` and return the service's response.
    fn submit(&self, file_name: &str, content: &[u8]) -> Result<ScanResponse>;

    /// Liveness check; returns the service's status message.
    fn health(&self) -> Result<String>;
}
