//! Time source for deduplication tokens

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Source of the current time and of unique request tokens
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Token for caller references and resource names, `<prefix>-<unix seconds>`
    fn token(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.now().timestamp())
    }
}

/// Wall clock
///
/// Tokens get a random suffix: two runs within the same second must still
/// produce distinct caller references.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn token(&self, prefix: &str) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}-{}", prefix, self.now().timestamp(), &suffix[..8])
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Utc>,
}

impl FixedClock {
    pub fn at_unix(seconds: i64) -> Self {
        Self {
            at: DateTime::from_timestamp(seconds, 0).unwrap_or_default(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }
}
