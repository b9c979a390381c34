// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client construction for rolesync.
//!
//! Every outbound call (token grants, authorization service, management API)
//! goes through a client built here so the User-Agent and timeouts are
//! consistent. The reconciliation core never retries and never times out on
//! its own; the bounds configured on this client are the only ones.

mod client;

pub use client::{builder, client_with_timeouts, user_agent, Timeouts};
