pub mod client;
pub mod models;

pub use client::{RunningDownload, YtDlpClient};
pub use models::{ExtractorConfig, OutputLine};
