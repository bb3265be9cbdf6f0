use iced::{
    widget::{button, column, pick_list, progress_bar, row, text, text_editor, text_input, Space},
    Alignment, Element, Length,
};

use crate::domain::{AudioFormat, UrlMode};

const LABEL_WIDTH: f32 = 190.0;
/// Ticks for the indeterminate bar to sweep across once.
const SWEEP_TICKS: u32 = 40;

/// Main view state
pub struct DownloadView {
    pub mode: UrlMode,
    pub single_url: String,
    pub multiple_urls: text_editor::Content,
    pub download_path: String,
    pub format: AudioFormat,
    pub status_message: String,
    pub is_downloading: bool,
    /// Animation step of the indeterminate progress bar.
    pub progress_tick: u32,
    mode_toggled: bool,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            mode: UrlMode::Single,
            single_url: String::new(),
            multiple_urls: text_editor::Content::new(),
            download_path: String::new(),
            format: AudioFormat::default(),
            status_message: "Enter a Bandcamp album URL to download".to_string(),
            is_downloading: false,
            progress_tick: 0,
            mode_toggled: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    ModeToggled,
    SingleUrlChanged(String),
    MultipleUrlsEdited(text_editor::Action),
    PathChanged(String),
    BrowsePressed,
    FormatSelected(AudioFormat),
    DownloadPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::ModeToggled | DownloadMessage::PathChanged(_)
                if self.is_downloading =>
            {
                // Form is locked while a batch runs
            }
            DownloadMessage::ModeToggled => {
                self.mode = self.mode.toggled();
                self.mode_toggled = true;
            }
            DownloadMessage::SingleUrlChanged(url) => {
                self.single_url = url;
            }
            DownloadMessage::MultipleUrlsEdited(action) => {
                self.multiple_urls.perform(action);
            }
            DownloadMessage::PathChanged(path) => {
                self.download_path = path;
            }
            DownloadMessage::FormatSelected(format) => {
                self.format = format;
            }
            DownloadMessage::BrowsePressed | DownloadMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn start_progress(&mut self) {
        self.is_downloading = true;
        self.progress_tick = 0;
    }

    pub fn stop_progress(&mut self) {
        self.is_downloading = false;
        self.progress_tick = 0;
    }

    pub fn advance_progress(&mut self) {
        if self.is_downloading {
            self.progress_tick = (self.progress_tick + 1) % (SWEEP_TICKS * 2);
        }
    }

    /// Position of the indeterminate bar, bouncing between 0 and 1.
    pub fn progress_value(&self) -> f32 {
        if !self.is_downloading {
            return 0.0;
        }
        let step = if self.progress_tick <= SWEEP_TICKS {
            self.progress_tick
        } else {
            SWEEP_TICKS * 2 - self.progress_tick
        };
        step as f32 / SWEEP_TICKS as f32
    }

    pub fn mode_button_label(&self) -> &'static str {
        match self.mode {
            UrlMode::Single => "Switch to Multiple Albums",
            UrlMode::Multiple => "Switch to Single Album",
        }
    }

    pub fn url_label(&self) -> &'static str {
        match self.mode {
            UrlMode::Single => "Album URL:",
            UrlMode::Multiple => "Album URLs (one per line):",
        }
    }

    pub fn download_button_label(&self) -> &'static str {
        match (self.mode_toggled, self.mode) {
            (false, _) => "Download Album(s)",
            (true, UrlMode::Single) => "Download Album",
            (true, UrlMode::Multiple) => "Download Albums",
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let url_input: Element<'_, DownloadMessage> = match self.mode {
            UrlMode::Single => text_input("https://artist.bandcamp.com/album/...", &self.single_url)
                .on_input(DownloadMessage::SingleUrlChanged)
                .padding(10)
                .into(),
            UrlMode::Multiple => text_editor(&self.multiple_urls)
                .placeholder("One album URL per line")
                .on_action(DownloadMessage::MultipleUrlsEdited)
                .height(Length::Fixed(120.0))
                .padding(10)
                .into(),
        };

        column![
            row![
                text("Bandcamp Downloader").size(28),
                Space::new().width(Length::Fill),
                button(self.mode_button_label())
                    .on_press_maybe((!self.is_downloading).then_some(DownloadMessage::ModeToggled))
                    .padding([8, 16]),
            ]
            .align_y(Alignment::Center),
            row![
                text(self.url_label()).size(16).width(Length::Fixed(LABEL_WIDTH)),
                url_input,
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            row![
                text("Download Path:").size(16).width(Length::Fixed(LABEL_WIDTH)),
                text_input("Select a folder...", &self.download_path)
                    .on_input_maybe((!self.is_downloading).then_some(DownloadMessage::PathChanged))
                    .padding(10),
                button("Browse")
                    .on_press_maybe((!self.is_downloading).then_some(DownloadMessage::BrowsePressed))
                    .padding([10, 20]),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            row![
                text("Format:").size(16).width(Length::Fixed(LABEL_WIDTH)),
                pick_list(
                    AudioFormat::ALL,
                    Some(self.format),
                    DownloadMessage::FormatSelected
                ),
            ]
            .spacing(10)
            .align_y(Alignment::Center),
            Space::new().height(Length::Fixed(10.0)),
            button(self.download_button_label())
                .on_press_maybe((!self.is_downloading).then_some(DownloadMessage::DownloadPressed))
                .padding([10, 20]),
            progress_bar(0.0..=1.0, self.progress_value()),
            text(&self.status_message).size(14),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}
