use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::Candidate;

/// Frame-level outcome shown in the overlay.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    NoTargets,
    Acquired,
}

impl TargetStatus {
    pub fn message(self) -> &'static str {
        match self {
            TargetStatus::NoTargets => "No targets.",
            TargetStatus::Acquired => "Target(s) acquired.",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Everything one analysis pass learned about a frame.
///
/// `candidates` holds every examined contour, accepted or not, in the order
/// the contour finder produced them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub status: TargetStatus,
    pub candidates: Vec<Candidate>,
}

impl DetectionResult {
    /// Derive the status from the candidates: acquired iff any is accepted.
    pub fn from_candidates(candidates: Vec<Candidate>) -> Self {
        let status = if candidates.iter().any(Candidate::is_accepted) {
            TargetStatus::Acquired
        } else {
            TargetStatus::NoTargets
        };
        Self { status, candidates }
    }

    pub fn accepted(&self) -> impl Iterator<Item = &Candidate> + '_ {
        self.candidates.iter().filter(|c| c.is_accepted())
    }

    pub fn num_accepted(&self) -> usize {
        self.accepted().count()
    }
}
