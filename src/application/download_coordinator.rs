use std::path::PathBuf;

use futures::{stream::BoxStream, StreamExt};
use tracing::{debug, info, warn};

use crate::{
    domain::{AppError, AudioFormat, DownloadRequest, ProgressReport, UrlMode},
    extractor::{OutputLine, RunningDownload, YtDlpClient},
    utils::{collect_urls, is_bandcamp_url},
};

#[derive(Debug, Clone)]
pub enum DownloadEvent {
    AlbumStarted {
        index: usize,
        total: usize,
        url: String,
    },
    Progress(ProgressReport),
    TrackSaved(PathBuf),
    AlbumFinished {
        index: usize,
        url: String,
    },
    Completed {
        albums: usize,
    },
    Failed(AppError),
}

#[derive(Clone)]
pub struct DownloadCoordinator {
    client: YtDlpClient,
}

impl DownloadCoordinator {
    pub fn new(client: YtDlpClient) -> Self {
        Self { client }
    }

    /// Turn raw form input into a request. The URL check comes first, so an
    /// entirely empty form reports the missing URL.
    pub fn prepare_request(
        &self,
        mode: UrlMode,
        single: &str,
        multiple: &str,
        path: &str,
        format: AudioFormat,
    ) -> Result<DownloadRequest, AppError> {
        let urls = collect_urls(mode, single, multiple);
        if urls.iter().all(String::is_empty) {
            return Err(AppError::MissingUrl);
        }

        let path = path.trim();
        if path.is_empty() {
            return Err(AppError::MissingPath);
        }

        for url in urls.iter().filter(|url| !is_bandcamp_url(url)) {
            warn!("{} does not look like a Bandcamp URL, passing it on anyway", url);
        }

        Ok(DownloadRequest {
            urls,
            destination: PathBuf::from(path),
            format,
        })
    }

    /// Download every URL of `request` in order, stopping at the first
    /// failure.
    pub fn download_stream(&self, request: DownloadRequest) -> BoxStream<'static, DownloadEvent> {
        info!(
            "Starting download of {} album(s) as {} into {}",
            request.urls.len(),
            request.format,
            request.destination.display()
        );

        futures::stream::unfold(
            BatchState::Next {
                client: self.client.clone(),
                request,
                index: 0,
            },
            |state| async move {
                match state {
                    BatchState::Next {
                        client,
                        request,
                        index,
                    } => {
                        let total = request.urls.len();
                        let Some(url) = request.urls.get(index).cloned() else {
                            info!("Finished downloading {} album(s)", total);
                            return Some((
                                DownloadEvent::Completed { albums: total },
                                BatchState::Finished,
                            ));
                        };

                        match client.spawn(&url, &request.destination, request.format) {
                            Ok(download) => Some((
                                DownloadEvent::AlbumStarted {
                                    index,
                                    total,
                                    url,
                                },
                                BatchState::Running {
                                    client,
                                    request,
                                    index,
                                    download,
                                },
                            )),
                            Err(e) => Some((DownloadEvent::Failed(e), BatchState::Finished)),
                        }
                    }
                    BatchState::Running {
                        client,
                        request,
                        index,
                        mut download,
                    } => loop {
                        match download.next_line().await {
                            Some(Ok(OutputLine::Progress(report))) => {
                                if report.is_downloading() {
                                    info!("{}", report);
                                }
                                return Some((
                                    DownloadEvent::Progress(report),
                                    BatchState::Running {
                                        client,
                                        request,
                                        index,
                                        download,
                                    },
                                ));
                            }
                            Some(Ok(OutputLine::File(path))) => {
                                info!("Saved {}", path.display());
                                return Some((
                                    DownloadEvent::TrackSaved(path),
                                    BatchState::Running {
                                        client,
                                        request,
                                        index,
                                        download,
                                    },
                                ));
                            }
                            Some(Ok(OutputLine::Other(line))) => {
                                debug!("yt-dlp: {}", line);
                            }
                            Some(Err(e)) => {
                                return Some((DownloadEvent::Failed(e), BatchState::Finished));
                            }
                            None => {
                                let url = request.urls[index].clone();
                                return match download.finish().await {
                                    Ok(()) => Some((
                                        DownloadEvent::AlbumFinished { index, url },
                                        BatchState::Next {
                                            client,
                                            request,
                                            index: index + 1,
                                        },
                                    )),
                                    Err(e) => {
                                        warn!("Download of {} failed: {}", url, e);
                                        Some((DownloadEvent::Failed(e), BatchState::Finished))
                                    }
                                };
                            }
                        }
                    },
                    BatchState::Finished => None,
                }
            },
        )
        .boxed()
    }
}

enum BatchState {
    Next {
        client: YtDlpClient,
        request: DownloadRequest,
        index: usize,
    },
    Running {
        client: YtDlpClient,
        request: DownloadRequest,
        index: usize,
        download: RunningDownload,
    },
    Finished,
}
