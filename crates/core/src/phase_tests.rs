// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    investigating = { PrpPhase::Investigating, "investigating" },
    planning      = { PrpPhase::Planning, "planning" },
    complete      = { PrpPhase::PlanningComplete, "planning_complete" },
    gate          = { PrpPhase::PlanGate, "plan_gate" },
    implementing  = { PrpPhase::Implementing, "implementing" },
)]
fn phase_roundtrips(phase: PrpPhase, s: &str) {
    assert_eq!(phase.as_str(), s);
    assert_eq!(PrpPhase::parse(s), Some(phase));
}

#[test]
fn unknown_phase_is_none() {
    assert_eq!(PrpPhase::parse("reviewing"), None);
    assert_eq!(PrpPhase::parse(""), None);
}
