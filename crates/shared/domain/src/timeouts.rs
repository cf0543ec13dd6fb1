use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_STEP: Duration = Duration::from_millis(2000);

/// Per-step time budgets of the lifecycle manager.
///
/// Each public operation is bounded by the sum of the budgets of the steps it performs,
/// see the `*_budget` helpers. Values are (de)serialized as milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationTimeouts {
    #[serde(with = "millis", rename = "check_correctness_ms")]
    pub check_correctness: Duration,
    #[serde(with = "millis", rename = "serialize_ms")]
    pub serialize: Duration,
    #[serde(with = "millis", rename = "deserialize_ms")]
    pub deserialize: Duration,
    #[serde(with = "millis", rename = "create_ms")]
    pub create: Duration,
    #[serde(with = "millis", rename = "delete_ms")]
    pub delete: Duration,
    #[serde(with = "millis", rename = "file_write_ms")]
    pub file_write: Duration,
    #[serde(with = "millis", rename = "file_read_ms")]
    pub file_read: Duration,
}

impl Default for OperationTimeouts {
    fn default() -> Self {
        Self::uniform(DEFAULT_STEP)
    }
}

impl OperationTimeouts {
    /// Same budget for every step.
    #[must_use]
    pub const fn uniform(step: Duration) -> Self {
        Self {
            check_correctness: step,
            serialize: step,
            deserialize: step,
            create: step,
            delete: step,
            file_write: step,
            file_read: step,
        }
    }

    /// Directory creation + file creation, encode, write.
    ///
    /// Budgets saturate, so `Duration::MAX` steps mean no deadline.
    #[must_use]
    pub const fn create_budget(&self) -> Duration {
        sum(&[self.create, self.serialize, self.file_write])
    }

    /// Optional check, encode, create-or-open, write.
    #[must_use]
    pub const fn save_budget(&self, check_correctness: bool) -> Duration {
        sum(&[self.optional_check(check_correctness), self.serialize, self.create, self.file_write])
    }

    /// Read, decode, optional check.
    #[must_use]
    pub const fn load_budget(&self, check_correctness: bool) -> Duration {
        sum(&[self.file_read, self.deserialize, self.optional_check(check_correctness)])
    }

    #[must_use]
    pub const fn initialize_budget(&self, check_correctness: bool) -> Duration {
        self.create_budget().saturating_add(self.load_budget(check_correctness))
    }

    #[must_use]
    pub const fn delete_budget(&self) -> Duration {
        self.delete
    }

    #[must_use]
    pub const fn check_budget(&self) -> Duration {
        self.check_correctness
    }

    const fn optional_check(&self, enabled: bool) -> Duration {
        if enabled { self.check_correctness } else { Duration::ZERO }
    }
}

const fn sum(steps: &[Duration]) -> Duration {
    let mut total = Duration::ZERO;
    let mut i = 0;
    while i < steps.len() {
        total = total.saturating_add(steps[i]);
        i += 1;
    }
    total
}

/// Serde adapter storing a [`Duration`] as whole milliseconds.
pub mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// # Errors
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    /// # Errors
    /// Fails if the input is not an unsigned integer.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
