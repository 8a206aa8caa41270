use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ObjectKind;

/// Transport-level failures returned by the HTTP front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MalformedRequest,
    NotFound,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// No recognised object key in the envelope.
    MalformedEnvelope,
    /// `command` missing or not in the object's allow-list.
    InvalidCommand,
    /// `value` missing or not in the currently valid set.
    InvalidValue,
    /// A mow-parameter field failed coercion or its range check.
    InvalidField,
    /// `robot`/`mow`/`task` with nothing selected.
    NoSelection,
    /// A route computation is already running.
    Busy,
    /// The route builder failed; selections stay committed.
    RouteFailed,
}

/// A validation outcome that was reported and ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{kind:?}: {message}")]
pub struct Rejection {
    pub kind: RejectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
}

impl Rejection {
    pub fn new(kind: RejectionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            object: None,
            field: None,
            message: message.into(),
            allowed: Vec::new(),
        }
    }

    pub fn on(mut self, object: ObjectKind) -> Self {
        self.object = Some(object);
        self
    }

    pub fn for_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn allowing(mut self, allowed: Vec<String>) -> Self {
        self.allowed = allowed;
        self
    }
}

