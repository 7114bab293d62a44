//! Recency windows such as `"3 months"` or `"14 days"`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StrategyError;

/// A look-back window relative to the job clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecencyWindow {
    Days(u32),
    Weeks(u32),
    Months(u32),
    Years(u32),
}

impl RecencyWindow {
    /// The instant `self` before `now`, clamped to the earliest
    /// representable time on overflow.
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let earlier = match *self {
            Self::Days(n) => now.checked_sub_signed(Duration::days(i64::from(n))),
            Self::Weeks(n) => now.checked_sub_signed(Duration::weeks(i64::from(n))),
            Self::Months(n) => now.checked_sub_months(Months::new(n)),
            Self::Years(n) => n
                .checked_mul(12)
                .and_then(|m| now.checked_sub_months(Months::new(m))),
        };
        earlier.unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl FromStr for RecencyWindow {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StrategyError::InvalidWindow(s.to_string());
        let mut parts = s.split_whitespace();
        let amount: u32 = parts
            .next()
            .and_then(|n| n.parse().ok())
            .ok_or_else(invalid)?;
        let unit = parts.next().ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }
        match unit.trim_end_matches('s') {
            "day" => Ok(Self::Days(amount)),
            "week" => Ok(Self::Weeks(amount)),
            "month" => Ok(Self::Months(amount)),
            "year" => Ok(Self::Years(amount)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for RecencyWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (n, unit) = match *self {
            Self::Days(n) => (n, "day"),
            Self::Weeks(n) => (n, "week"),
            Self::Months(n) => (n, "month"),
            Self::Years(n) => (n, "year"),
        };
        let plural = if n == 1 { "" } else { "s" };
        write!(f, "{n} {unit}{plural}")
    }
}

impl TryFrom<String> for RecencyWindow {
    type Error = StrategyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecencyWindow> for String {
    fn from(value: RecencyWindow) -> Self {
        value.to_string()
    }
}
