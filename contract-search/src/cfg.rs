//! Runtime configuration loaded from environment variables.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Knobs for [`crate::TaskSearch`]. All fields have defaults via `from_env`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// `top_n` used when the caller does not pass one.
    pub default_top_n: usize,
    /// Largest accepted `top_n`.
    pub max_top_n: usize,
    /// Tasks per contract shown to the explanation prompt.
    pub tasks_shown: usize,
    /// Queries allowed to run at once.
    pub max_in_flight: usize,
    pub retry: RetryPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_n: 5,
            max_top_n: 20,
            tasks_shown: 5,
            max_in_flight: 4,
            retry: RetryPolicy::default(),
        }
    }
}

impl SearchConfig {
    /// Build from environment variables with sensible defaults.
    ///
    /// `SEARCH_TOP_N`, `SEARCH_MAX_TOP_N`, `EXPLAIN_TASKS_SHOWN`,
    /// `SEARCH_MAX_IN_FLIGHT`, `LLM_CALL_TIMEOUT_SECS`, `LLM_MAX_RETRIES`,
    /// `LLM_RETRY_BASE_MS`. Unparsable values fall back to the default.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            default_top_n: parse("SEARCH_TOP_N", d.default_top_n),
            max_top_n: parse("SEARCH_MAX_TOP_N", d.max_top_n),
            tasks_shown: parse("EXPLAIN_TASKS_SHOWN", d.tasks_shown),
            max_in_flight: parse("SEARCH_MAX_IN_FLIGHT", d.max_in_flight),
            retry: RetryPolicy {
                max_retries: parse("LLM_MAX_RETRIES", d.retry.max_retries),
                base_delay: Duration::from_millis(parse("LLM_RETRY_BASE_MS", 500u64)),
                call_timeout: Duration::from_secs(parse("LLM_CALL_TIMEOUT_SECS", 60u64)),
            },
        }
        .normalized()
    }

    /// Clamps counts to at least one and keeps `default_top_n <= max_top_n`.
    pub fn normalized(mut self) -> Self {
        self.default_top_n = self.default_top_n.max(1);
        self.max_top_n = self.max_top_n.max(self.default_top_n);
        self.tasks_shown = self.tasks_shown.max(1);
        self.max_in_flight = self.max_in_flight.max(1);
        if self.retry.call_timeout.is_zero() {
            self.retry.call_timeout = RetryPolicy::default().call_timeout;
        }
        self
    }
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(dflt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_fixes_degenerate_values() {
        let cfg = SearchConfig {
            default_top_n: 0,
            max_top_n: 0,
            tasks_shown: 0,
            max_in_flight: 0,
            retry: RetryPolicy {
                call_timeout: Duration::ZERO,
                ..RetryPolicy::default()
            },
        }
        .normalized();

        assert_eq!(cfg.default_top_n, 1);
        assert_eq!(cfg.max_top_n, 1);
        assert_eq!(cfg.tasks_shown, 1);
        assert_eq!(cfg.max_in_flight, 1);
        assert_eq!(cfg.retry.call_timeout, Duration::from_secs(60));
    }

    #[test]
    fn max_never_drops_below_default() {
        let cfg = SearchConfig {
            default_top_n: 10,
            max_top_n: 3,
            ..SearchConfig::default()
        }
        .normalized();
        assert_eq!(cfg.max_top_n, 10);
    }
}
