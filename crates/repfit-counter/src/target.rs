//! Target repetition counts parsed from plan text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Repetition goal for one set, as written by the plan author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum RepTarget {
    /// "12"
    Exact { reps: u32 },
    /// "8-12"
    Range { min: u32, max: u32 },
    /// "AMRAP", "30s", anything without a usable count
    Open,
}

impl RepTarget {
    /// Rep count at which a camera-tracked set finishes on its own.
    /// Ranges finish at their upper bound; open targets only finish manually.
    pub fn auto_complete_at(&self) -> Option<u32> {
        match *self {
            RepTarget::Exact { reps } => Some(reps),
            RepTarget::Range { max, .. } => Some(max),
            RepTarget::Open => None,
        }
    }

    pub fn parse_lenient(text: &str) -> Self {
        text.parse().unwrap_or(RepTarget::Open)
    }
}

impl FromStr for RepTarget {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let positive = |part: &str| part.trim().parse::<u32>().ok().filter(|n| *n > 0);

        if let Some(reps) = positive(s) {
            return Ok(RepTarget::Exact { reps });
        }

        let range = s
            .split_once(['-', '\u{2013}', '\u{2014}'])
            .and_then(|(lo, hi)| Some((positive(lo)?, positive(hi)?)))
            .filter(|(min, max)| min <= max);

        Ok(match range {
            Some((min, max)) => RepTarget::Range { min, max },
            None => RepTarget::Open,
        })
    }
}

impl fmt::Display for RepTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepTarget::Exact { reps } => write!(f, "{reps}"),
            RepTarget::Range { min, max } => write!(f, "{min}-{max}"),
            RepTarget::Open => f.write_str("open"),
        }
    }
}
