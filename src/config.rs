use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default tick period when neither `interval_seconds` nor `interval_minutes`
/// is configured.
const DEFAULT_INTERVAL_MINUTES: u64 = 5;

/// Settings for the scheduler and its synchronisation job.
///
/// Loaded once from a flat YAML key/value map (see `load_config`); unknown
/// keys are ignored. The scheduler holds this behind a shared lock so
/// interval/jitter changes take effect on the next tick, while a run that
/// already snapshotted its values completes unaffected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Remote folder path to synchronise from.
    pub sharepoint_folder: String,
    /// Local directory downloads land in.
    pub ingestion_dir: PathBuf,
    /// Tick period in whole minutes. Ignored when `interval_seconds` is set.
    #[serde(default)]
    pub interval_minutes: Option<u64>,
    /// Tick period in (possibly fractional) seconds. Takes precedence over
    /// `interval_minutes`; sub-second values are valid.
    #[serde(default)]
    pub interval_seconds: Option<f64>,
    /// Upper bound for the random additive jitter applied per tick.
    #[serde(default)]
    pub jitter_seconds: u64,
    /// Whether a new job invocation may start while a previous one is mid-flight.
    #[serde(default)]
    pub allow_overlap: bool,
    /// How long shutdown waits for the loop and any in-flight run.
    #[serde(default = "default_shutdown_timeout_seconds")]
    pub shutdown_timeout_seconds: f64,
    /// Per-file download retry budget (retries after the initial attempt).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Delay between download attempts for the same file.
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: f64,
}

fn default_shutdown_timeout_seconds() -> f64 {
    30.0
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_seconds() -> f64 {
    5.0
}

impl SchedulerConfig {
    /// Base tick period. `interval_seconds` wins over `interval_minutes`.
    pub fn interval(&self) -> Duration {
        if let Some(secs) = self.interval_seconds {
            return Duration::from_secs_f64(secs.max(0.0));
        }
        let minutes = self.interval_minutes.unwrap_or(DEFAULT_INTERVAL_MINUTES);
        Duration::from_secs(minutes * 60)
    }

    /// Inclusive upper bound for per-tick jitter.
    pub fn jitter_bound(&self) -> Duration {
        Duration::from_secs(self.jitter_seconds)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.shutdown_timeout_seconds.max(0.0))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs_f64(self.retry_delay_seconds.max(0.0))
    }

    pub fn trace_loaded(&self) {
        info!(
            sharepoint_folder = %self.sharepoint_folder,
            ingestion_dir = %self.ingestion_dir.display(),
            interval_ms = self.interval().as_millis() as u64,
            jitter_seconds = self.jitter_seconds,
            allow_overlap = self.allow_overlap,
            max_retries = self.max_retries,
            "Loaded SchedulerConfig"
        );
        debug!(?self, "SchedulerConfig loaded (full debug)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> SchedulerConfig {
        SchedulerConfig {
            sharepoint_folder: "/shared/reports".into(),
            ingestion_dir: PathBuf::from("/tmp/ingest"),
            interval_minutes: None,
            interval_seconds: None,
            jitter_seconds: 0,
            allow_overlap: false,
            shutdown_timeout_seconds: default_shutdown_timeout_seconds(),
            max_retries: default_max_retries(),
            retry_delay_seconds: default_retry_delay_seconds(),
        }
    }

    #[test]
    fn interval_defaults_to_five_minutes() {
        assert_eq!(minimal().interval(), Duration::from_secs(300));
    }

    #[test]
    fn interval_seconds_takes_precedence_over_minutes() {
        let mut config = minimal();
        config.interval_minutes = Some(10);
        config.interval_seconds = Some(0.25);
        assert_eq!(config.interval(), Duration::from_millis(250));
    }

    #[test]
    fn interval_minutes_used_when_seconds_absent() {
        let mut config = minimal();
        config.interval_minutes = Some(2);
        assert_eq!(config.interval(), Duration::from_secs(120));
    }

    #[test]
    fn durations_from_fractional_seconds() {
        let mut config = minimal();
        config.shutdown_timeout_seconds = 0.5;
        config.retry_delay_seconds = 0.0;
        assert_eq!(config.shutdown_timeout(), Duration::from_millis(500));
        assert_eq!(config.retry_delay(), Duration::ZERO);
    }
}
