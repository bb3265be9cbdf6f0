mod app;
mod application;
mod config;
mod domain;
mod extractor;
mod logging;
mod ui;
mod utils;

use clap::Parser;
use iced::window;

fn main() -> iced::Result {
    let settings = config::Settings::parse();
    logging::init(settings.log_level.as_deref());

    iced::application(
        move || app::DownloadApp::new(&settings),
        app::update,
        app::view,
    )
    .title("Bandcamp Downloader")
    .subscription(app::subscription)
    .window(window::Settings {
        size: iced::Size::new(720.0, 460.0),
        ..Default::default()
    })
    .run()
}
