// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured-methodology phase tracking.
//!
//! The phase is written into session metadata by the in-workspace post-tool
//! hook and by the gate-resume path; the lifecycle poller only observes it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phase of the structured methodology (investigate → plan → implement).
///
/// `PlanGate` is set by the orchestrator when the plan gate fires;
/// `Implementing` only by the gate-resume path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrpPhase {
    Investigating,
    Planning,
    PlanningComplete,
    PlanGate,
    Implementing,
}

impl PrpPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrpPhase::Investigating => "investigating",
            PrpPhase::Planning => "planning",
            PrpPhase::PlanningComplete => "planning_complete",
            PrpPhase::PlanGate => "plan_gate",
            PrpPhase::Implementing => "implementing",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "investigating" => PrpPhase::Investigating,
            "planning" => PrpPhase::Planning,
            "planning_complete" => PrpPhase::PlanningComplete,
            "plan_gate" => PrpPhase::PlanGate,
            "implementing" => PrpPhase::Implementing,
            _ => return None,
        })
    }
}

impl fmt::Display for PrpPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;
