//! Sliding-window length parsed from `"<n><unit>"` strings.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::ConfigError;

const SECOND: u64 = 1;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;

/// Length of the rolling window over which a quota is measured.
///
/// Accepts a positive integer magnitude followed by exactly one unit
/// suffix: `h` (hours), `m` (minutes) or `s` (seconds).
///
/// ```
/// use rpc_throttle::config::Window;
/// use std::time::Duration;
///
/// let window: Window = "5m".parse().unwrap();
/// assert_eq!(window.as_duration(), Duration::from_secs(300));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Window {
    secs: u64,
}

impl Window {
    /// Parse a window string such as `"10s"`, `"5m"` or `"2h"`.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let invalid = |reason| ConfigError::InvalidWindow {
            input: input.to_owned(),
            reason,
        };

        let Some(unit) = input.chars().last() else {
            return Err(invalid("empty string"));
        };
        let scale = match unit {
            'h' => HOUR,
            'm' => MINUTE,
            's' => SECOND,
            _ => return Err(invalid("missing unit suffix (expected h, m or s)")),
        };

        let magnitude = &input[..input.len() - unit.len_utf8()];
        if magnitude.is_empty() {
            return Err(invalid("missing numeric magnitude"));
        }
        if !magnitude.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("magnitude must be a positive integer"));
        }
        let value: u64 = magnitude
            .parse()
            .map_err(|_| invalid("magnitude out of range"))?;
        if value == 0 {
            return Err(invalid("magnitude must be greater than 0"));
        }
        let secs = value
            .checked_mul(scale)
            .ok_or_else(|| invalid("magnitude out of range"))?;

        Ok(Self { secs })
    }

    /// Window as a [`Duration`].
    pub const fn as_duration(self) -> Duration {
        Duration::from_secs(self.secs)
    }
}

impl FromStr for Window {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Window {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Window> for String {
    fn from(window: Window) -> Self {
        window.to_string()
    }
}

impl From<Window> for Duration {
    fn from(window: Window) -> Self {
        window.as_duration()
    }
}

/// Canonical form using the largest unit that divides the length exactly.
impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secs % HOUR == 0 {
            write!(f, "{}h", self.secs / HOUR)
        } else if self.secs % MINUTE == 0 {
            write!(f, "{}m", self.secs / MINUTE)
        } else {
            write!(f, "{}s", self.secs)
        }
    }
}
