// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod cache;
pub mod db;
pub mod repositories;

pub use cache::{DisabledCacheStore, InMemoryCacheStore};
pub use db::Database;
