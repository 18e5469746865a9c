//! Reconciliation error taxonomy

use std::fmt;
use thiserror::Error;

use crate::api::ApiError;

/// Kind of remote entity an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    ProcessGroup,
    Processor,
    Connection,
    ControllerService,
    Port,
    Funnel,
    RemoteProcessGroup,
    ReportingTask,
    User,
    Group,
    DropRequest,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::ProcessGroup => "process group",
            EntityKind::Processor => "processor",
            EntityKind::Connection => "connection",
            EntityKind::ControllerService => "controller service",
            EntityKind::Port => "port",
            EntityKind::Funnel => "funnel",
            EntityKind::RemoteProcessGroup => "remote process group",
            EntityKind::ReportingTask => "reporting task",
            EntityKind::User => "user",
            EntityKind::Group => "group",
            EntityKind::DropRequest => "drop request",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("{kind} {id} has a stale revision: {source}")]
    Conflict {
        kind: EntityKind,
        id: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to create {kind}: {source}")]
    CreateFailed {
        kind: EntityKind,
        #[source]
        source: ApiError,
    },

    #[error("Failed to read {kind} {id}: {source}")]
    ReadFailed {
        kind: EntityKind,
        id: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to update {kind} {id}: {source}")]
    UpdateFailed {
        kind: EntityKind,
        id: String,
        #[source]
        source: ApiError,
    },

    #[error("Failed to delete {kind} {id}: {source}")]
    DeleteFailed {
        kind: EntityKind,
        id: String,
        #[source]
        source: ApiError,
    },

    /// A required stop/disable step failed, so the sequence was aborted.
    #[error("Failed to {step}: {source}")]
    Transition {
        step: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid configuration: {0}")]
    Schema(String),

    #[error("Found {count} tenants with identity {identity}")]
    AmbiguousIdentity { identity: String, count: usize },

    #[error("Unsupported connection endpoint type: {0}")]
    InvalidEndpoint(String),

    #[error("{what} did not converge after {attempts} attempts")]
    ConvergenceTimeout { what: String, attempts: u32 },

    #[error("Cannot import {type_name} {id}: no such entity")]
    ImportFailed { type_name: String, id: String },

    #[error("Provider not configured")]
    NotConfigured,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    pub(crate) fn create(kind: EntityKind, source: ApiError) -> Self {
        Error::CreateFailed { kind, source }
    }

    pub(crate) fn read(kind: EntityKind, id: &str, source: ApiError) -> Self {
        if source.is_not_found() {
            return Error::NotFound {
                kind,
                id: id.to_string(),
            };
        }
        Error::ReadFailed {
            kind,
            id: id.to_string(),
            source,
        }
    }

    pub(crate) fn update(kind: EntityKind, id: &str, source: ApiError) -> Self {
        match source.status() {
            Some(404) => Error::NotFound {
                kind,
                id: id.to_string(),
            },
            Some(409) => Error::Conflict {
                kind,
                id: id.to_string(),
                source,
            },
            _ => Error::UpdateFailed {
                kind,
                id: id.to_string(),
                source,
            },
        }
    }

    pub(crate) fn delete(kind: EntityKind, id: &str, source: ApiError) -> Self {
        match source.status() {
            Some(404) => Error::NotFound {
                kind,
                id: id.to_string(),
            },
            Some(409) => Error::Conflict {
                kind,
                id: id.to_string(),
                source,
            },
            _ => Error::DeleteFailed {
                kind,
                id: id.to_string(),
                source,
            },
        }
    }

    pub(crate) fn transition(step: impl Into<String>, source: Error) -> Self {
        Error::Transition {
            step: step.into(),
            source: Box::new(source),
        }
    }
}
