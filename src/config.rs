use std::path::PathBuf;

use clap::{Parser, ValueHint};

use crate::domain::AudioFormat;
use crate::extractor::ExtractorConfig;

/// Download Bandcamp albums through yt-dlp.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "bandcamp-downloader", version, about)]
pub struct Settings {
    /// Path to the yt-dlp executable.
    ///
    /// If not provided, yt-dlp will be searched for in $PATH
    #[arg(long = "yt-dlp", env = "BANDCAMP_DL_YT_DLP", value_hint = ValueHint::FilePath)]
    yt_dlp_path: Option<PathBuf>,

    /// Directory the download path field starts with.
    #[arg(long, env = "BANDCAMP_DL_DOWNLOAD_DIR", value_hint = ValueHint::DirPath)]
    pub download_dir: Option<PathBuf>,

    /// Format selected when the window opens.
    #[arg(long, env = "BANDCAMP_DL_FORMAT", value_enum, default_value_t = AudioFormat::Mp3)]
    pub format: AudioFormat,

    /// Convert downloads to the selected format with ffmpeg.
    #[arg(long, env = "BANDCAMP_DL_EXTRACT_AUDIO")]
    pub extract_audio: bool,

    /// Extra log directives, e.g. `bandcamp_downloader=debug`.
    #[arg(long, env = "BANDCAMP_DL_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Settings {
    /// The configured yt-dlp, else the one on `$PATH`, else the bare name.
    pub fn yt_dlp_path(&self) -> PathBuf {
        self.yt_dlp_path
            .clone()
            .or_else(|| which::which("yt-dlp").ok())
            .unwrap_or_else(|| PathBuf::from("yt-dlp"))
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        ExtractorConfig {
            yt_dlp_path: self.yt_dlp_path(),
            extract_audio: self.extract_audio,
        }
    }
}
