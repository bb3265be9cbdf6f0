use std::path::PathBuf;
use std::time::Duration;

use futures::StreamExt;
use iced::{Subscription, Task};
use rfd::{AsyncFileDialog, AsyncMessageDialog, MessageButtons, MessageLevel};
use tracing::{error, info};

use crate::application::{DownloadCoordinator, DownloadEvent};
use crate::config::Settings;
use crate::domain::{AppError, DownloadPhase};
use crate::extractor::YtDlpClient;
use crate::ui::{DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    coordinator: DownloadCoordinator,
    phase: DownloadPhase,
}

impl Default for DownloadApp {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl DownloadApp {
    pub fn new(settings: &Settings) -> Self {
        let config = settings.extractor_config();
        info!("Using yt-dlp at {}", config.yt_dlp_path.display());

        let mut view = DownloadView::default();
        view.format = settings.format;
        if let Some(dir) = &settings.download_dir {
            view.download_path = dir.display().to_string();
        }

        Self {
            view,
            coordinator: DownloadCoordinator::new(YtDlpClient::new(config)),
            phase: DownloadPhase::Idle,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Result of the Browse folder picker
    FolderSelected(Option<PathBuf>),
    Download(DownloadEvent),
    /// Frame of the indeterminate progress animation
    Tick,
    DialogClosed,
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::BrowsePressed => {
                    let start_dir = PathBuf::from(app.view.download_path.trim());
                    return Task::perform(
                        async move {
                            let mut dialog =
                                AsyncFileDialog::new().set_title("Select download directory");
                            if start_dir.is_dir() {
                                dialog = dialog.set_directory(&start_dir);
                            }
                            dialog
                                .pick_folder()
                                .await
                                .map(|handle| handle.path().to_path_buf())
                        },
                        Message::FolderSelected,
                    );
                }
                DownloadMessage::DownloadPressed if !app.view.is_downloading => {
                    return start_download(app);
                }
                _ => {}
            }
        }
        Message::FolderSelected(Some(path)) => {
            app.view.download_path = path.display().to_string();
        }
        Message::FolderSelected(None) => {
            // Picker cancelled, keep the current path
        }
        Message::Download(event) => return handle_download_event(app, event),
        Message::Tick => app.view.advance_progress(),
        Message::DialogClosed => {}
    }
    Task::none()
}

fn start_download(app: &mut DownloadApp) -> Task<Message> {
    let request = match app.coordinator.prepare_request(
        app.view.mode,
        &app.view.single_url,
        &app.view.multiple_urls.text(),
        &app.view.download_path,
        app.view.format,
    ) {
        Ok(request) => request,
        Err(e) => {
            app.view.status_message = e.to_string();
            return show_dialog(MessageLevel::Error, "Error", e.to_string());
        }
    };

    app.phase = DownloadPhase::Downloading;
    app.view.start_progress();
    app.view.status_message = format!("Starting download of {} album(s)...", request.urls.len());

    Task::stream(
        app.coordinator
            .download_stream(request)
            .map(Message::Download),
    )
}

fn handle_download_event(app: &mut DownloadApp, event: DownloadEvent) -> Task<Message> {
    match event {
        DownloadEvent::AlbumStarted { index, total, url } => {
            app.view.status_message = format!("Album {} of {}: {}", index + 1, total, url);
        }
        DownloadEvent::Progress(report) => {
            if report.is_downloading() {
                app.view.status_message = report.to_string();
            }
        }
        DownloadEvent::TrackSaved(path) => {
            app.view.status_message = format!("Saved: {}", path.display());
        }
        DownloadEvent::AlbumFinished { index, url } => {
            info!("Album {} finished: {}", index + 1, url);
        }
        DownloadEvent::Completed { albums } => {
            app.phase = DownloadPhase::Completed;
            app.view.stop_progress();
            app.view.status_message = format!("Downloaded {} album(s)", albums);
            return show_dialog(
                MessageLevel::Info,
                "Success",
                "Download(s) completed successfully.".to_string(),
            );
        }
        DownloadEvent::Failed(e) => return fail(app, &e),
    }
    Task::none()
}

fn fail(app: &mut DownloadApp, e: &AppError) -> Task<Message> {
    error!("Download failed: {}", e);
    app.phase = DownloadPhase::Failed;
    app.view.stop_progress();
    app.view.status_message = format!("Download failed: {}", e);
    show_dialog(
        MessageLevel::Error,
        "Download Error",
        format!("An error occurred: {}", e),
    )
}

fn show_dialog(level: MessageLevel, title: &'static str, description: String) -> Task<Message> {
    Task::perform(
        async move {
            AsyncMessageDialog::new()
                .set_level(level)
                .set_title(title)
                .set_description(description)
                .set_buttons(MessageButtons::Ok)
                .show()
                .await
        },
        |_| Message::DialogClosed,
    )
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

pub fn subscription(app: &DownloadApp) -> Subscription<Message> {
    if app.phase == DownloadPhase::Downloading {
        iced::time::every(Duration::from_millis(40)).map(|_| Message::Tick)
    } else {
        Subscription::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProgressReport;

    fn app_with_url() -> DownloadApp {
        let mut app = DownloadApp::default();
        app.view.single_url = "https://a.bandcamp.com/album/x".to_string();
        app.view.download_path = "/music".to_string();
        app
    }

    #[test]
    fn test_empty_url_does_not_start() {
        let mut app = DownloadApp::default();
        app.view.download_path = "/music".to_string();
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));

        assert!(!app.view.is_downloading);
        assert_eq!(app.phase, DownloadPhase::Idle);
        assert_eq!(
            app.view.status_message,
            "Please enter at least one Bandcamp album URL."
        );
    }

    #[test]
    fn test_empty_path_does_not_start() {
        let mut app = app_with_url();
        app.view.download_path = "   ".to_string();
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));

        assert!(!app.view.is_downloading);
        assert_eq!(app.view.status_message, "Please select a download directory.");
    }

    #[test]
    fn test_download_disables_button_until_done() {
        let mut app = app_with_url();
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));
        assert!(app.view.is_downloading);
        assert_eq!(app.phase, DownloadPhase::Downloading);

        // A second press while running is ignored.
        app.view.status_message = "busy".to_string();
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));
        assert_eq!(app.view.status_message, "busy");

        let _ = update(
            &mut app,
            Message::Download(DownloadEvent::Completed { albums: 1 }),
        );
        assert!(!app.view.is_downloading);
        assert_eq!(app.phase, DownloadPhase::Completed);
        assert_eq!(app.view.progress_value(), 0.0);
    }

    #[test]
    fn test_failure_reenables_button() {
        let mut app = app_with_url();
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));
        let _ = update(
            &mut app,
            Message::Download(DownloadEvent::Failed(AppError::Extractor(
                "Unable to download webpage".to_string(),
            ))),
        );

        assert!(!app.view.is_downloading);
        assert_eq!(app.phase, DownloadPhase::Failed);
        assert_eq!(
            app.view.status_message,
            "Download failed: Unable to download webpage"
        );
    }

    #[test]
    fn test_progress_updates_status() {
        let mut app = app_with_url();
        let _ = update(&mut app, Message::UiMessage(DownloadMessage::DownloadPressed));
        let _ = update(
            &mut app,
            Message::Download(DownloadEvent::Progress(ProgressReport {
                status: "downloading".to_string(),
                percent: "50.0%".to_string(),
                total: "2.00MiB".to_string(),
            })),
        );
        assert_eq!(app.view.status_message, "Downloading: 50.0% of 2.00MiB");

        let _ = update(&mut app, Message::Tick);
        assert!(app.view.progress_value() > 0.0);
    }

    #[test]
    fn test_cancelled_picker_keeps_path() {
        let mut app = app_with_url();
        let _ = update(&mut app, Message::FolderSelected(None));
        assert_eq!(app.view.download_path, "/music");

        let _ = update(&mut app, Message::FolderSelected(Some(PathBuf::from("/other"))));
        assert_eq!(app.view.download_path, "/other");
    }
}
