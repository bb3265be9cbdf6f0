use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::ProgressReport;

/// Configuration for the yt-dlp client
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub yt_dlp_path: PathBuf,
    /// Convert with `--extract-audio` instead of only selecting a format.
    pub extract_audio: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            yt_dlp_path: PathBuf::from("yt-dlp"),
            extract_audio: false,
        }
    }
}

/// Subset of yt-dlp's progress dict, printed once per line by our progress
/// template.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressPayload {
    #[serde(default)]
    pub status: String,
    #[serde(rename = "_percent_str", default)]
    pub percent_str: Option<String>,
    #[serde(rename = "_total_bytes_str", default)]
    pub total_bytes_str: Option<String>,
}

impl From<ProgressPayload> for ProgressReport {
    fn from(payload: ProgressPayload) -> Self {
        Self {
            status: payload.status,
            percent: payload
                .percent_str
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            total: payload
                .total_bytes_str
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

/// A classified line from yt-dlp's stdout.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
    Progress(ProgressReport),
    File(PathBuf),
    Other(String),
}

/// A classified line from yt-dlp's stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticLine {
    Error(String),
    Warning(String),
    Other(String),
}
