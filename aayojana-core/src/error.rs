//! Error types for the aayojana hooks.

use thiserror::Error;

use crate::model::Role;
use crate::remote::{RemoteError, Table};

/// Errors that can occur in aayojana operations.
#[derive(Error, Debug)]
pub enum AayojanaError {
    #[error("You must be signed in to do that")]
    AuthRequired,

    #[error("The '{0}' role is required")]
    RoleRequired(Role),

    #[error("Could not load {table}: {source}")]
    RemoteFetch {
        table: Table,
        #[source]
        source: RemoteError,
    },

    #[error("Could not write to {table}: {source}")]
    RemoteMutation {
        table: Table,
        #[source]
        source: RemoteError,
    },

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(u8),

    #[error("No event selected")]
    NoEventSelected,

    #[error("Feedback cannot be empty")]
    EmptyFeedback,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AayojanaError {
    pub(crate) fn fetch(table: Table, source: RemoteError) -> Self {
        AayojanaError::RemoteFetch { table, source }
    }

    pub(crate) fn mutation(table: Table, source: RemoteError) -> Self {
        AayojanaError::RemoteMutation { table, source }
    }
}

/// Result type alias for aayojana operations.
pub type AayojanaResult<T> = Result<T, AayojanaError>;
