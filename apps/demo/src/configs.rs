//! Sample config types, one per naming and capability combination.

use async_trait::async_trait;
use confhub::prelude::{Capabilities, Config, NamingMetadata};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// No naming metadata and no hooks: lands in `Character.cfg`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Character {
    pub(crate) name: String,
    pub(crate) max_hp: u32,
}

impl Default for Character {
    fn default() -> Self {
        Self { name: "Wanderer".into(), max_hp: 100 }
    }
}

impl Config for Character {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ConsoleTheme {
    pub(crate) foreground: String,
    pub(crate) background: String,
}

impl Default for ConsoleTheme {
    fn default() -> Self {
        Self { foreground: "green".into(), background: "blue".into() }
    }
}

impl Config for ConsoleTheme {
    fn naming() -> NamingMetadata {
        NamingMetadata::new().directory("relative/theme")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Timings {
    pub(crate) loading_delay_ms: u64,
    pub(crate) attempts: u32,
}

impl Default for Timings {
    fn default() -> Self {
        Self { loading_delay_ms: 150, attempts: 3 }
    }
}

impl Timings {
    pub(crate) const fn loading_delay(&self) -> Duration {
        Duration::from_millis(self.loading_delay_ms)
    }
}

impl Config for Timings {
    fn naming() -> NamingMetadata {
        NamingMetadata::new().directory("relative/timings").file_name("timings.json")
    }
}

/// Start and stop times of the previous run.
///
/// The clock values live in transient fields; the persisted form is milliseconds since the
/// epoch, synchronized by the serialization hooks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Timestamps {
    started_at_ms: u64,
    stopped_at_ms: u64,
    #[serde(skip, default = "SystemTime::now")]
    pub(crate) started_at: SystemTime,
    #[serde(skip, default = "epoch")]
    pub(crate) stopped_at: SystemTime,
}

impl Default for Timestamps {
    fn default() -> Self {
        let mut stamps = Self {
            started_at_ms: 0,
            stopped_at_ms: 0,
            started_at: SystemTime::now(),
            stopped_at: UNIX_EPOCH,
        };
        stamps.on_before_serialize();
        stamps
    }
}

#[async_trait]
impl Config for Timestamps {
    const CAPABILITIES: Capabilities = Capabilities::all();

    fn naming() -> NamingMetadata {
        NamingMetadata::new().directory("stamps").file_name("stamps.txt")
    }

    fn on_before_serialize(&mut self) {
        self.started_at_ms = millis_since_epoch(self.started_at);
        self.stopped_at_ms = millis_since_epoch(self.stopped_at);
    }

    fn on_after_deserialize(&mut self) {
        self.started_at = UNIX_EPOCH + Duration::from_millis(self.started_at_ms);
        self.stopped_at = UNIX_EPOCH + Duration::from_millis(self.stopped_at_ms);
    }

    async fn check_data_correctness(&self) -> Result<(), Cow<'static, str>> {
        if self.stopped_at_ms != 0 && self.stopped_at_ms < self.started_at_ms {
            return Err("stop time precedes start time".into());
        }
        Ok(())
    }
}

const fn epoch() -> SystemTime {
    UNIX_EPOCH
}

fn millis_since_epoch(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
