// ABOUTME: Storage error type shared by the identity store, client registry and session store
// ABOUTME: Wraps sqlx errors when the database-errors feature is enabled
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Errors raised by persistence backends
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Could not open or reach the database
    #[error("Database connection failed: {reason}")]
    ConnectionFailed {
        /// Underlying cause
        reason: String,
    },

    /// Schema migration failed
    #[error("Database migration failed: {reason}")]
    MigrationFailed {
        /// Underlying cause
        reason: String,
    },

    /// A stored row could not be mapped to a domain type
    #[error("Invalid stored value for '{field}': {reason}")]
    InvalidData {
        /// Column or field name
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// An update targeted a row that does not exist
    #[error("{entity_type} '{entity_id}' not found")]
    NotFound {
        /// Kind of entity
        entity_type: &'static str,
        /// Lookup key
        entity_id: String,
    },

    /// Query execution failed
    #[cfg(feature = "database-errors")]
    #[error("Query failed: {context}")]
    Query {
        /// Operation that was running
        context: &'static str,
        /// Underlying sqlx error
        #[source]
        source: sqlx::Error,
    },
}

impl DatabaseError {
    /// Create an `InvalidData` error
    pub fn invalid_data(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            field,
            reason: reason.into(),
        }
    }

    /// Wrap a sqlx error with the operation that produced it
    #[cfg(feature = "database-errors")]
    #[must_use]
    pub const fn query(context: &'static str, source: sqlx::Error) -> Self {
        Self::Query { context, source }
    }
}

#[cfg(feature = "database-errors")]
impl From<sqlx::Error> for DatabaseError {
    fn from(source: sqlx::Error) -> Self {
        Self::Query {
            context: "sql",
            source,
        }
    }
}
