// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline stage identity and ordering.
//!
//! A job moves through three stages in strict order: SEARCH, RANK, REPORT.
//! A job's broader lifecycle position is tracked by the distinct
//! [`Phase`](crate::job::Phase) enum, which wraps these three stages plus
//! the non-executable bookend phases (`init`, `upload`, `complete`,
//! `error`); see [`Phase::as_stage`](crate::job::Phase::as_stage).

use serde::{Deserialize, Serialize};

/// One stage of the SEARCH -> RANK -> REPORT pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Search,
    Rank,
    Report,
}

crate::simple_display! {
    StageKind {
        Search => "search",
        Rank => "rank",
        Report => "report",
    }
}

impl StageKind {
    /// All stages in pipeline order.
    pub const ORDER: [StageKind; 3] = [StageKind::Search, StageKind::Rank, StageKind::Report];

    /// Zero-based position in the pipeline (SEARCH=0, RANK=1, REPORT=2).
    pub fn index(self) -> usize {
        match self {
            StageKind::Search => 0,
            StageKind::Rank => 1,
            StageKind::Report => 2,
        }
    }

    /// The stage that immediately follows this one, if any.
    pub fn next(self) -> Option<StageKind> {
        match self {
            StageKind::Search => Some(StageKind::Rank),
            StageKind::Rank => Some(StageKind::Report),
            StageKind::Report => None,
        }
    }

    /// True if `self` is strictly ahead of `other` in pipeline order.
    pub fn is_ahead_of(self, other: StageKind) -> bool {
        self.index() > other.index()
    }

    /// How many stages ahead `self` is of `other` (negative if behind).
    pub fn distance_from(self, other: StageKind) -> i32 {
        self.index() as i32 - other.index() as i32
    }

    pub fn is_first(self) -> bool {
        self == StageKind::Search
    }

    pub fn is_last(self) -> bool {
        self == StageKind::Report
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
