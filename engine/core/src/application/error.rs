// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Errors and Audited Results
//!
//! [`ModerationError`] is the taxonomy exposed to callers of the engine.
//! Authorization failures (`Forbidden`) are not part of it: the engine only
//! answers questions, the caller decides what a negative answer means.
//!
//! Mutating operations return [`Audited`] values. An audit-log failure never
//! undoes the action it documents, so it travels next to the result as an
//! [`AuditWarning`] instead of replacing it with an error.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::domain::mod_log::{ModActionType, ModLogId};
use crate::domain::pagination::PageError;
use crate::domain::repository::RepositoryError;

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ModerationError {
    /// Wrap a store error with the operation context (entity and keys).
    pub fn from_repository(context: impl AsRef<str>, err: RepositoryError) -> Self {
        let context = context.as_ref();
        match err {
            RepositoryError::NotFound(detail) => {
                ModerationError::NotFound(format!("{}: {}", context, detail))
            }
            RepositoryError::Conflict(detail) => {
                ModerationError::Conflict(format!("{}: {}", context, detail))
            }
            other => ModerationError::Internal(format!("{}: {}", context, other)),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ModerationError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ModerationError::Conflict(_))
    }
}

impl From<PageError> for ModerationError {
    fn from(err: PageError) -> Self {
        ModerationError::InvalidInput(err.to_string())
    }
}

/// Run one store call under `timeout`, mapping failures to
/// [`ModerationError`] with `context` attached.
pub(crate) async fn with_deadline<T, F>(
    timeout: Duration,
    context: impl FnOnce() -> String,
    call: F,
) -> Result<T, ModerationError>
where
    F: Future<Output = Result<T, RepositoryError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(ModerationError::from_repository(context(), err)),
        Err(_) => Err(ModerationError::Internal(format!(
            "{}: store call timed out after {:?}",
            context(),
            timeout
        ))),
    }
}

/// An audit entry that could not be written for an action that did happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditWarning {
    pub action_type: ModActionType,
    pub message: String,
}

/// Result of a mutating operation together with the fate of its audit entry.
#[derive(Debug, Clone)]
pub struct Audited<T> {
    pub value: T,
    pub log_id: Option<ModLogId>,
    pub audit_warning: Option<AuditWarning>,
}

impl<T> Audited<T> {
    pub fn logged(value: T, log_id: ModLogId) -> Self {
        Self {
            value,
            log_id: Some(log_id),
            audit_warning: None,
        }
    }

    pub fn unlogged(value: T, warning: AuditWarning) -> Self {
        Self {
            value,
            log_id: None,
            audit_warning: Some(warning),
        }
    }

    pub fn is_logged(&self) -> bool {
        self.audit_warning.is_none()
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Audited<U> {
        Audited {
            value: f(self.value),
            log_id: self.log_id,
            audit_warning: self.audit_warning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_errors_keep_context() {
        let err = ModerationError::from_repository(
            "moderator u1 in c1",
            RepositoryError::Conflict("duplicate key".to_string()),
        );
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "Conflict: moderator u1 in c1: duplicate key");

        let err = ModerationError::from_repository(
            "ban u2 in c1",
            RepositoryError::Database("connection reset".to_string()),
        );
        assert!(matches!(err, ModerationError::Internal(ref m) if m.contains("connection reset") && m.contains("ban u2 in c1")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expires() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, RepositoryError>(())
        };
        let err = with_deadline(Duration::from_secs(1), || "report r1".to_string(), slow)
            .await
            .unwrap_err();
        assert!(matches!(err, ModerationError::Internal(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn test_deadline_passes_value_through() {
        let value = with_deadline(Duration::from_secs(1), || unreachable!(), async {
            Ok::<_, RepositoryError>(42)
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
    }
}
