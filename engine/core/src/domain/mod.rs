// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer
//!
//! Aggregates, value objects and the persistence/cache contracts of the
//! moderation engine. Nothing here performs I/O.

pub mod identity;
pub mod permission;
pub mod moderator;
pub mod ban;
pub mod report;
pub mod mod_log;
pub mod pagination;
pub mod repository;
pub mod cache;
pub mod config;
