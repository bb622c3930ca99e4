// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Warden Core
//!
//! Moderation authorization and enforcement engine for community platforms:
//! a fixed role-permission registry, the moderator directory, the ban ledger,
//! the report workflow, an append-only audit log and a read-through
//! authorization cache.
//!
//! # Architecture
//!
//! - `domain`: aggregates, value objects, repository and cache contracts, configuration
//! - `application`: services and the [`ModerationEngine`] facade
//! - `infrastructure`: in-memory and PostgreSQL repositories, cache stores, connection pool

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use domain::*;
pub use application::{Audited, AuditWarning, ModerationEngine, ModerationError};
