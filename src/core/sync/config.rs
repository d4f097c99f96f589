/*!
 * Synchronization Configuration
 *
 * Runtime configuration for backend selection and mutex spinning
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Signal backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// Address-keyed parking (Linux preferred)
    Futex,
    /// Mutex + condition variable (cross-platform, reliable)
    Condvar,
    /// Auto-select based on platform
    Auto,
}

impl StrategyType {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "futex" => Some(Self::Futex),
            "condvar" => Some(Self::Condvar),
            "auto" => Some(Self::Auto),
            _ => None,
        }
    }
}

/// Synchronization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Preferred signal backend
    pub strategy: StrategyType,
    /// Upper bound on time spent spinning before a blocking mutex lock parks
    #[serde(with = "micros")]
    pub spin_duration: Duration,
    /// Maximum try-lock attempts before a blocking mutex lock parks
    pub max_spins: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_duration: Duration::from_micros(10),
            max_spins: 100,
        }
    }
}

impl SyncConfig {
    /// Configuration optimized for short critical sections
    pub const fn low_latency() -> Self {
        Self {
            strategy: StrategyType::Auto,
            spin_duration: Duration::from_micros(50),
            max_spins: 500,
        }
    }

    /// Configuration optimized for long holds (park almost immediately)
    pub const fn long_wait() -> Self {
        Self {
            strategy: StrategyType::Condvar,
            spin_duration: Duration::from_micros(1),
            max_spins: 10,
        }
    }

    /// Load overrides from the environment
    ///
    /// Environment variables:
    /// - PLATFORM_SYNC_STRATEGY: futex | condvar | auto
    /// - PLATFORM_SYNC_SPIN_US: spin budget in microseconds
    /// - PLATFORM_SYNC_MAX_SPINS: try-lock attempts before parking
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("PLATFORM_SYNC_STRATEGY") {
            match StrategyType::parse(&value) {
                Some(strategy) => config.strategy = strategy,
                None => warn!(value = %value, "Ignoring unknown PLATFORM_SYNC_STRATEGY"),
            }
        }

        if let Ok(value) = std::env::var("PLATFORM_SYNC_SPIN_US") {
            match value.trim().parse::<u64>() {
                Ok(us) => config.spin_duration = Duration::from_micros(us),
                Err(e) => warn!(value = %value, error = %e, "Ignoring invalid PLATFORM_SYNC_SPIN_US"),
            }
        }

        if let Ok(value) = std::env::var("PLATFORM_SYNC_MAX_SPINS") {
            match value.trim().parse::<u32>() {
                Ok(spins) => config.max_spins = spins,
                Err(e) => warn!(value = %value, error = %e, "Ignoring invalid PLATFORM_SYNC_MAX_SPINS"),
            }
        }

        config
    }

    /// Parse a JSON configuration document; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Select best backend for current platform
    pub fn select_strategy(&self) -> StrategyType {
        match self.strategy {
            StrategyType::Auto => {
                // Prefer futex on Linux, condvar elsewhere
                #[cfg(target_os = "linux")]
                {
                    StrategyType::Futex
                }
                #[cfg(not(target_os = "linux"))]
                {
                    StrategyType::Condvar
                }
            }
            other => other,
        }
    }
}

mod micros {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_micros)
    }
}
