use tracing::Level;
use tracing_subscriber::{filter::Directive, fmt, prelude::*, EnvFilter};

pub const COMPONENT_LEVELS: &[(&str, Level)] = &[("bandcamp_downloader", Level::INFO)];

/// Install the global subscriber. `directives` uses the `RUST_LOG` syntax and
/// is layered over [`COMPONENT_LEVELS`].
pub fn init(directives: Option<&str>) {
    let result = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(build_filter(directives))
        .try_init();

    if let Err(e) = result {
        eprintln!("Failed to install logger: {e}");
    }
}

pub fn build_filter(directives: Option<&str>) -> EnvFilter {
    let default_levels = COMPONENT_LEVELS
        .iter()
        .map(|(target, level)| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",");

    let mut filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .parse_lossy(default_levels);

    let extra = directives
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<Directive>() {
            Ok(d) => Some(d),
            Err(e) => {
                eprintln!("Failed to parse log level directive {s:?}: {e:?}");
                None
            }
        })
        .collect::<Vec<_>>();

    for d in extra {
        filter = filter.add_directive(d);
    }

    filter
}
