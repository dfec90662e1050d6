use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::professional::EmploymentState;

/// Recruitment pipeline status of a job offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Created,
    SelectionPhase,
    CandidateProposal,
    Consolidated,
    Done,
    Abort,
}

impl JobStatus {
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Created,
        JobStatus::SelectionPhase,
        JobStatus::CandidateProposal,
        JobStatus::Consolidated,
        JobStatus::Done,
        JobStatus::Abort,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            JobStatus::Created => "CREATED",
            JobStatus::SelectionPhase => "SELECTION_PHASE",
            JobStatus::CandidateProposal => "CANDIDATE_PROPOSAL",
            JobStatus::Consolidated => "CONSOLIDATED",
            JobStatus::Done => "DONE",
            JobStatus::Abort => "ABORT",
        }
    }

    /// Transition table: every status reachable in one step from `self`.
    pub const fn next_statuses(self) -> &'static [JobStatus] {
        match self {
            JobStatus::Created => &[JobStatus::SelectionPhase, JobStatus::Abort],
            JobStatus::SelectionPhase => &[JobStatus::CandidateProposal, JobStatus::Abort],
            JobStatus::CandidateProposal => &[JobStatus::Consolidated, JobStatus::Abort],
            JobStatus::Consolidated => &[JobStatus::Done, JobStatus::Abort],
            JobStatus::Done | JobStatus::Abort => &[],
        }
    }

    pub fn can_transition_to(self, next: JobStatus) -> bool {
        self.next_statuses().contains(&next)
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Abort)
    }

    /// Offers may be edited or deleted only before consolidation.
    pub const fn is_mutable(self) -> bool {
        matches!(
            self,
            JobStatus::Created | JobStatus::SelectionPhase | JobStatus::CandidateProposal
        )
    }

}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown job offer status '{}'", s))
    }
}

/// Candidate professional together with the employment state observed when it joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSnapshot {
    pub professional_id: i64,
    pub employment_state: EmploymentState,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobOffer {
    pub id: i64,
    pub customer_id: i64,
    pub status: JobStatus,
    pub required_skills: Vec<String>,
    pub duration: i32,
    pub value: Decimal,
    pub note: Option<String>,
    pub candidates: Vec<CandidateSnapshot>,
    pub professional_id: Option<i64>,
    pub creation_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub version: i64,
}

impl JobOffer {
    pub fn candidate_professional_ids(&self) -> BTreeSet<i64> {
        self.candidates.iter().map(|c| c.professional_id).collect()
    }

    pub fn candidate(&self, professional_id: i64) -> Option<&CandidateSnapshot> {
        self.candidates
            .iter()
            .find(|c| c.professional_id == professional_id)
    }

    /// Value is computed exactly once, when a professional is assigned.
    pub fn has_computed_value(&self) -> bool {
        self.professional_id.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewJobOffer {
    pub customer_id: i64,
    pub required_skills: Vec<String>,
    pub duration: i32,
    pub note: Option<String>,
}

/// Largest value a `NUMERIC(16, 2)` contract value column holds.
pub fn max_contract_value() -> Decimal {
    Decimal::new(9_999_999_999_999_999, 2)
}

/// Contract value: daily rate times duration. `None` when it does not fit.
pub fn contract_value(daily_rate: Decimal, duration: i32) -> Option<Decimal> {
    daily_rate
        .checked_mul(Decimal::from(duration))
        .filter(|value| *value <= max_contract_value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_path_is_allowed() {
        assert!(JobStatus::Created.can_transition_to(JobStatus::SelectionPhase));
        assert!(JobStatus::SelectionPhase.can_transition_to(JobStatus::CandidateProposal));
        assert!(JobStatus::CandidateProposal.can_transition_to(JobStatus::Consolidated));
        assert!(JobStatus::Consolidated.can_transition_to(JobStatus::Done));
    }

    #[test]
    fn abort_reachable_from_every_non_terminal_status() {
        for status in JobStatus::ALL {
            assert_eq!(
                status.can_transition_to(JobStatus::Abort),
                !status.is_terminal(),
                "{status}"
            );
        }
    }

    #[test]
    fn terminal_statuses_accept_nothing() {
        for next in JobStatus::ALL {
            assert!(!JobStatus::Done.can_transition_to(next));
            assert!(!JobStatus::Abort.can_transition_to(next));
        }
    }

    #[test]
    fn skipping_and_going_back_are_rejected() {
        assert!(!JobStatus::Created.can_transition_to(JobStatus::Consolidated));
        assert!(!JobStatus::Created.can_transition_to(JobStatus::Created));
        assert!(!JobStatus::CandidateProposal.can_transition_to(JobStatus::SelectionPhase));
        assert!(!JobStatus::Consolidated.can_transition_to(JobStatus::CandidateProposal));
        assert!(!JobStatus::SelectionPhase.can_transition_to(JobStatus::Done));
    }

    #[test]
    fn status_names_round_trip_through_serde_and_from_str() {
        let json = serde_json::to_string(&JobStatus::SelectionPhase).unwrap();
        assert_eq!(json, "\"SELECTION_PHASE\"");
        assert_eq!(
            "candidate_proposal".parse::<JobStatus>().unwrap(),
            JobStatus::CandidateProposal
        );
        assert!("HIRED".parse::<JobStatus>().is_err());
    }

    #[test]
    fn value_is_rate_times_duration() {
        assert_eq!(contract_value(Decimal::from(100), 3), Some(Decimal::from(300)));
        assert_eq!(contract_value(Decimal::new(12550, 2), 0), Some(Decimal::ZERO));
    }

    #[test]
    fn oversized_value_is_rejected_instead_of_overflowing() {
        let max = max_contract_value();
        assert_eq!(contract_value(Decimal::MAX, 2), None);
        assert_eq!(contract_value(max, 2), None);
        assert_eq!(contract_value(max, 1), Some(max));
    }
}
