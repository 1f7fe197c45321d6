use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Log targets of the contract-scout crates, this one first.
pub const WORKSPACE_TARGETS: [&str; 5] = [
    "ai_llm_service",
    "task_store",
    "contract_search",
    "api",
    "contract_scout",
];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
pub struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Application-wide formatting layer.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format with target
/// - Span close events (duration of instrumented provider calls)
/// - ANSI colors only when stdout is a terminal
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .compact()
}

/// Level directive for one log target, e.g. `task_store=debug`.
pub fn level_directive(target: &str, level: Level) -> Directive {
    let s = format!("{target}={}", level.as_str().to_lowercase());
    Directive::from_str(&s).unwrap_or_else(|_| LevelFilter::INFO.into())
}

/// `EnvFilter` from `RUST_LOG` or `default`, with `level` for every
/// workspace crate. Directives already present in `RUST_LOG` take precedence.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    WORKSPACE_TARGETS
        .iter()
        .filter(|t| !from_env.contains(&format!("{t}=")))
        .fold(base, |f, t| f.add_directive(level_directive(t, level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_names_target_and_level() {
        let d = level_directive("contract_search", Level::DEBUG);
        assert_eq!(d.to_string(), "contract_search=debug");
    }
}
