use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentState {
    AvailableForWork,
    Employed,
    Unemployed,
    NotAvailable,
}

impl EmploymentState {
    pub const ALL: [EmploymentState; 4] = [
        EmploymentState::AvailableForWork,
        EmploymentState::Employed,
        EmploymentState::Unemployed,
        EmploymentState::NotAvailable,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            EmploymentState::AvailableForWork => "AVAILABLE_FOR_WORK",
            EmploymentState::Employed => "EMPLOYED",
            EmploymentState::Unemployed => "UNEMPLOYED",
            EmploymentState::NotAvailable => "NOT_AVAILABLE",
        }
    }
}

impl fmt::Display for EmploymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmploymentState::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown employment state '{}'", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
    pub id: i64,
    pub name: String,
    pub skills: Vec<String>,
    pub geographical_location: String,
    pub daily_rate: Decimal,
    pub employment_state: EmploymentState,
    /// Bumped on every employment state change; used for compare-and-swap.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Professional {
    pub fn is_available(&self) -> bool {
        self.employment_state == EmploymentState::AvailableForWork
    }
}

/// Daily rates are stored as `NUMERIC(14, 2)`.
pub const DAILY_RATE_SCALE: u32 = 2;

pub fn max_daily_rate() -> Decimal {
    Decimal::new(99_999_999_999_999, DAILY_RATE_SCALE)
}

#[derive(Debug, Clone)]
pub struct NewProfessional {
    pub name: String,
    pub skills: Vec<String>,
    pub geographical_location: String,
    pub daily_rate: Decimal,
}
