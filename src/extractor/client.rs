use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, error, trace, warn};

use super::models::{DiagnosticLine, ExtractorConfig, OutputLine, ProgressPayload};
use crate::domain::{AppError, AudioFormat};

const ALBUM_DIR_TEMPLATE: &str = "%(artist)s - %(album)s";
const TRACK_FILE_TEMPLATE: &str = "%(track_number)s - %(title)s.%(ext)s";

const PROGRESS_PREFIX: &str = "[progress] ";
const FILE_PREFIX: &str = "[file] ";

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").expect("valid ANSI regex"));

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone)]
pub struct YtDlpClient {
    config: ExtractorConfig,
}

impl YtDlpClient {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// `<dest>/<artist> - <album>/<track> - <title>.<ext>`
    pub fn output_template(destination: &Path) -> PathBuf {
        destination
            .join(ALBUM_DIR_TEMPLATE)
            .join(TRACK_FILE_TEMPLATE)
    }

    /// Arguments for downloading a single URL.
    pub fn command_args(&self, url: &str, destination: &Path, format: AudioFormat) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--newline".into(),
            "--progress".into(),
            "--progress-template".into(),
            format!(
                "download:{}%(progress.{{status,_percent_str,_total_bytes_str}})j",
                PROGRESS_PREFIX
            )
            .into(),
            "--no-simulate".into(),
            "--print".into(),
            format!("after_move:{}%(filepath)j", FILE_PREFIX).into(),
            "--format".into(),
            format.as_str().into(),
            "--output".into(),
            Self::output_template(destination).into_os_string(),
        ];

        if self.config.extract_audio {
            args.extend([
                "--extract-audio".into(),
                "--audio-format".into(),
                format.as_str().into(),
            ]);
        }

        args.push("--".into());
        args.push(url.into());
        args
    }

    /// Start yt-dlp for one URL. Output is read through the returned handle.
    pub fn spawn(&self, url: &str, destination: &Path, format: AudioFormat) -> Result<RunningDownload> {
        let mut cmd = Command::new(&self.config.yt_dlp_path);
        cmd.args(self.command_args(url, destination, format))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        debug!("Running cmd: {:?}", &cmd);

        let mut child = cmd
            .spawn()
            .map_err(|e| AppError::Spawn(format!("{}: {}", self.config.yt_dlp_path.display(), e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Io("yt-dlp stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AppError::Io("yt-dlp stderr was not captured".to_string()))?;

        Ok(RunningDownload {
            child,
            stdout: Some(LossyLines::new(stdout)),
            stderr: Some(LossyLines::new(stderr)),
            last_error: None,
        })
    }
}

/// Line reader that never fails on bad encoding. yt-dlp prints file names
/// in whatever bytes the filesystem gave it, so invalid UTF-8 is replaced
/// rather than treated as a read error.
pub struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LossyLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// Cancel safe: a partially read line stays in `buf` for the next call.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        let line = String::from_utf8_lossy(&self.buf)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        self.buf.clear();
        Ok(Some(line))
    }
}

enum Pipe {
    Stdout(std::io::Result<Option<String>>),
    Stderr(std::io::Result<Option<String>>),
}

/// A yt-dlp process that is still producing output.
pub struct RunningDownload {
    child: Child,
    stdout: Option<LossyLines<ChildStdout>>,
    stderr: Option<LossyLines<ChildStderr>>,
    last_error: Option<String>,
}

impl RunningDownload {
    /// Next line of stdout. Stderr is drained alongside so neither pipe can
    /// fill up. Returns `None` once both streams are closed.
    pub async fn next_line(&mut self) -> Option<Result<OutputLine>> {
        loop {
            let next = match (self.stdout.as_mut(), self.stderr.as_mut()) {
                (None, None) => return None,
                (Some(stdout), None) => Pipe::Stdout(stdout.next_line().await),
                (None, Some(stderr)) => Pipe::Stderr(stderr.next_line().await),
                (Some(stdout), Some(stderr)) => tokio::select! {
                    line = stdout.next_line() => Pipe::Stdout(line),
                    line = stderr.next_line() => Pipe::Stderr(line),
                },
            };

            match next {
                Pipe::Stdout(Ok(Some(line))) => return Some(Ok(parse_output_line(&line))),
                Pipe::Stdout(Ok(None)) => self.stdout = None,
                Pipe::Stdout(Err(e)) => {
                    self.stdout = None;
                    return Some(Err(AppError::Io(format!(
                        "Failed to read yt-dlp output: {}",
                        e
                    ))));
                }
                Pipe::Stderr(Ok(Some(line))) => self.record_diagnostic(&line),
                Pipe::Stderr(Ok(None)) => self.stderr = None,
                Pipe::Stderr(Err(e)) => {
                    // The pipe is unusable after an I/O error; stdout and the
                    // exit status still decide the outcome.
                    warn!("Failed to read yt-dlp diagnostics: {}", e);
                    self.stderr = None;
                }
            }
        }
    }

    fn record_diagnostic(&mut self, line: &str) {
        match parse_diagnostic_line(line) {
            DiagnosticLine::Error(message) => {
                error!("yt-dlp: {}", message);
                self.last_error = Some(message);
            }
            DiagnosticLine::Warning(message) => warn!("yt-dlp: {}", message),
            DiagnosticLine::Other(message) => debug!("yt-dlp: {}", message),
        }
    }

    /// Wait for the process to exit and turn a failure into the extractor's
    /// own error message.
    pub async fn finish(mut self) -> Result<()> {
        // Drain whatever is left so the last ERROR line is seen.
        while let Some(line) = self.next_line().await {
            if let Ok(line) = line {
                trace!("Discarding yt-dlp output: {:?}", line);
            }
        }

        let status = self
            .child
            .wait()
            .await
            .map_err(|e| AppError::Io(format!("Failed to wait for yt-dlp: {}", e)))?;
        trace!("yt-dlp exited: {:?}", status);

        if status.success() {
            Ok(())
        } else {
            Err(AppError::Extractor(
                self.last_error
                    .take()
                    .unwrap_or_else(|| format!("yt-dlp exited with {}", status)),
            ))
        }
    }
}

pub fn parse_output_line(line: &str) -> OutputLine {
    let line = strip_ansi(line);
    let trimmed = line.trim();

    if let Some(json) = trimmed.strip_prefix(PROGRESS_PREFIX) {
        if let Ok(mut payload) = serde_json::from_str::<ProgressPayload>(json) {
            // Colour codes can survive inside the preformatted strings.
            payload.percent_str = payload.percent_str.map(|s| strip_ansi(&s).into_owned());
            payload.total_bytes_str = payload.total_bytes_str.map(|s| strip_ansi(&s).into_owned());
            return OutputLine::Progress(payload.into());
        }
    }

    if let Some(json) = trimmed.strip_prefix(FILE_PREFIX) {
        if let Ok(path) = serde_json::from_str::<String>(json) {
            return OutputLine::File(PathBuf::from(path));
        }
    }

    OutputLine::Other(trimmed.to_string())
}

pub fn parse_diagnostic_line(line: &str) -> DiagnosticLine {
    let line = strip_ansi(line);
    let trimmed = line.trim();

    if let Some(message) = trimmed.strip_prefix("ERROR:") {
        DiagnosticLine::Error(message.trim().to_string())
    } else if let Some(message) = trimmed.strip_prefix("WARNING:") {
        DiagnosticLine::Warning(message.trim().to_string())
    } else {
        DiagnosticLine::Other(trimmed.to_string())
    }
}

fn strip_ansi(line: &str) -> std::borrow::Cow<'_, str> {
    ANSI_ESCAPE.replace_all(line, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProgressReport;

    fn args_as_strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_output_template() {
        let template = YtDlpClient::output_template(Path::new("/music"));
        assert_eq!(
            template,
            Path::new("/music")
                .join("%(artist)s - %(album)s")
                .join("%(track_number)s - %(title)s.%(ext)s")
        );
    }

    #[test]
    fn test_command_args_select_format() {
        let client = YtDlpClient::new(ExtractorConfig::default());
        let args = args_as_strings(&client.command_args(
            "https://artist.bandcamp.com/album/x",
            Path::new("/music"),
            AudioFormat::Flac,
        ));

        let format_at = args.iter().position(|a| a == "--format").unwrap();
        assert_eq!(args[format_at + 1], "flac");
        let output_at = args.iter().position(|a| a == "--output").unwrap();
        assert!(args[output_at + 1].ends_with("%(track_number)s - %(title)s.%(ext)s"));
        assert!(!args.contains(&"--extract-audio".to_string()));
        assert_eq!(
            &args[args.len() - 2..],
            ["--", "https://artist.bandcamp.com/album/x"]
        );
    }

    #[test]
    fn test_command_args_extract_audio() {
        let client = YtDlpClient::new(ExtractorConfig {
            extract_audio: true,
            ..Default::default()
        });
        let args = args_as_strings(&client.command_args(
            "https://artist.bandcamp.com/album/x",
            Path::new("/music"),
            AudioFormat::Ogg,
        ));
        let at = args.iter().position(|a| a == "--audio-format").unwrap();
        assert_eq!(args[at - 1], "--extract-audio");
        assert_eq!(args[at + 1], "ogg");
    }

    #[test]
    fn test_parse_progress_line() {
        let line = r#"[progress] {"status": "downloading", "_percent_str": "\u001b[0;94m 12.5%\u001b[0m", "_total_bytes_str": "  8.01MiB"}"#;
        assert_eq!(
            parse_output_line(line),
            OutputLine::Progress(ProgressReport {
                status: "downloading".to_string(),
                percent: "12.5%".to_string(),
                total: "8.01MiB".to_string(),
            })
        );

        let finished = r#"[progress] {"status": "finished"}"#;
        match parse_output_line(finished) {
            OutputLine::Progress(report) => {
                assert!(!report.is_downloading());
                assert_eq!(report.percent, "N/A");
            }
            other => panic!("unexpected line: {:?}", other),
        }
    }

    #[test]
    fn test_parse_file_and_other_lines() {
        assert_eq!(
            parse_output_line(r#"[file] "/music/A - B/01 - \"C\".mp3""#),
            OutputLine::File(PathBuf::from(r#"/music/A - B/01 - "C".mp3"#))
        );
        assert_eq!(
            parse_output_line("[Bandcamp] Extracting URL"),
            OutputLine::Other("[Bandcamp] Extracting URL".to_string())
        );
        assert_eq!(
            parse_output_line("[progress] not json"),
            OutputLine::Other("[progress] not json".to_string())
        );
    }

    #[test]
    fn test_parse_diagnostic_line() {
        assert_eq!(
            parse_diagnostic_line("ERROR: [Bandcamp] x: Unable to download webpage"),
            DiagnosticLine::Error("[Bandcamp] x: Unable to download webpage".to_string())
        );
        assert_eq!(
            parse_diagnostic_line("WARNING: Requested format is not available"),
            DiagnosticLine::Warning("Requested format is not available".to_string())
        );
        assert_eq!(
            parse_diagnostic_line("[debug] something"),
            DiagnosticLine::Other("[debug] something".to_string())
        );
    }

    #[tokio::test]
    async fn test_lossy_lines_replace_invalid_utf8() {
        let input: &[u8] = b"[download] Destination: caf\xe9.mp3\r\nERROR: boom\nno newline";
        let mut lines = LossyLines::new(input);

        assert_eq!(
            lines.next_line().await.unwrap().as_deref(),
            Some("[download] Destination: caf\u{FFFD}.mp3")
        );
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("ERROR: boom"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("no newline"));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_spawn_missing_binary() {
        let client = YtDlpClient::new(ExtractorConfig {
            yt_dlp_path: PathBuf::from("/definitely/not/here/yt-dlp"),
            extract_audio: false,
        });
        let result = client.spawn("https://a.bandcamp.com/album/x", Path::new("/tmp"), AudioFormat::Mp3);
        assert!(matches!(result, Err(AppError::Spawn(_))));
    }
}
