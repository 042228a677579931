// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! ao-daemon: the webhook receiver and the long-running orchestrator
//! process.
//!
//! Signature verification happens on the raw body before any JSON is
//! parsed. Verified deliveries always answer 200 — even when nothing
//! matches or a spawn fails — so providers never build retry storms against
//! us. 401 is reserved for bad signatures, 400 for unparsable JSON.

pub mod normalize;
#[cfg(test)]
pub(crate) mod test_helpers;
pub mod resume;
pub mod server;
pub mod signature;

pub use server::{router, AppCtx};
