use std::fmt;
use std::path::PathBuf;

/// Audio formats offered in the format picker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum AudioFormat {
    #[default]
    Mp3,
    Flac,
    Ogg,
    Wav,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 4] = [Self::Mp3, Self::Flac, Self::Ogg, Self::Wav];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::Wav => "wav",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UrlMode {
    #[default]
    Single,
    Multiple,
}

impl UrlMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Single => Self::Multiple,
            Self::Multiple => Self::Single,
        }
    }
}

/// A validated batch, ready to be handed to the extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub urls: Vec<String>,
    pub destination: PathBuf,
    pub format: AudioFormat,
}

/// Progress as reported by yt-dlp for the file currently being fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub status: String,
    pub percent: String,
    pub total: String,
}

impl ProgressReport {
    pub fn is_downloading(&self) -> bool {
        self.status == "downloading"
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Downloading: {} of {}", self.percent, self.total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadPhase {
    Idle,
    Downloading,
    Completed,
    Failed,
}
