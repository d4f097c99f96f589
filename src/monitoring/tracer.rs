/*!
 * Structured Tracing
 * Subscriber setup and timed spans using the tracing crate
 *
 * Uptime-stamped, thread-tagged output; compact or JSON
 */

use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::fmt::{format::FmtSpan, time::uptime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Scenarios slower than this are logged as warnings
const SLOW_SCENARIO: Duration = Duration::from_millis(500);

/// Default filter when RUST_LOG is unset: this crate's lifecycle events at
/// debug, everything else at info
const DEFAULT_FILTER: &str = "info,platform_sync=debug";

/// Initialize structured tracing
///
/// Timestamps are uptime (time since init) so wait latencies and timeouts
/// read directly off the log. Every event carries the emitting thread's name
/// and id.
///
/// Environment variables:
/// - RUST_LOG: Override the filter (default: info, platform_sync=debug)
/// - PLATFORM_SYNC_TRACE_JSON: Enable JSON output (default: false)
///
/// Returns `false` if a global subscriber was already installed, in which
/// case that subscriber is left in place.
pub fn init_tracing() -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let use_json = json_requested(std::env::var("PLATFORM_SYNC_TRACE_JSON").ok().as_deref());

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_timer(uptime())
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_timer(uptime())
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_target(false)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Tracing ready");
    }
    installed
}

fn json_requested(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("1") | Some("true") | Some("TRUE") | Some("yes"))
}

/// Timed span around one scenario; logs its outcome on drop
pub struct ScenarioSpan {
    span: tracing::Span,
    start: Instant,
    name: String,
    passed: Option<bool>,
}

impl ScenarioSpan {
    pub fn new(name: &str) -> Self {
        let span = span!(
            Level::INFO,
            "scenario",
            scenario = name,
            duration_us = tracing::field::Empty,
            result = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            name: name.to_string(),
            passed: None,
        }
    }

    /// Enter the span context
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Record the scenario result
    pub fn record_result(&mut self, passed: bool) {
        self.passed = Some(passed);
        self.span.record("result", if passed { "pass" } else { "fail" });
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScenarioSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        let _entered = self.span.enter();
        self.span.record("duration_us", duration.as_micros() as u64);

        match self.passed {
            Some(false) => warn!(scenario = %self.name, duration_ms = duration.as_millis() as u64, "scenario failed"),
            _ if duration > SLOW_SCENARIO => warn!(
                scenario = %self.name,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow scenario"
            ),
            _ => debug!(scenario = %self.name, duration_us = duration.as_micros() as u64, "scenario completed"),
        }
    }
}

/// Create a timed scenario span
pub fn span_scenario(name: &str) -> ScenarioSpan {
    ScenarioSpan::new(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_flag_values() {
        assert!(json_requested(Some("1")));
        assert!(json_requested(Some(" true ")));
        assert!(!json_requested(Some("0")));
        assert!(!json_requested(None));
    }

    #[test]
    fn test_second_init_keeps_existing_subscriber() {
        init_tracing();
        assert!(!init_tracing());
    }

    #[test]
    fn test_scenario_span_records_result() {
        let mut span = span_scenario("unit");
        {
            let _entered = span.enter();
        }
        span.record_result(true);
        assert_eq!(span.passed, Some(true));
        assert!(span.elapsed() < Duration::from_secs(5));
    }
}
