//! Wire shapes for command replies.
//!
//! The host bridge that carries these over an embedder channel is out of
//! scope; this module only fixes the JSON shapes both sides agree on.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::SessionError;

/// Reply to one session command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CommandOutcome {
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    Error {
        code: String,
        message: String,
    },
}

impl CommandOutcome {
    pub fn ok() -> Self {
        CommandOutcome::Ok { value: None }
    }

    pub fn ok_with(value: Value) -> Self {
        CommandOutcome::Ok { value: Some(value) }
    }

    pub fn error(error: &SessionError) -> Self {
        CommandOutcome::Error {
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

impl From<Result<Value, SessionError>> for CommandOutcome {
    fn from(result: Result<Value, SessionError>) -> Self {
        match result {
            Ok(value) => CommandOutcome::ok_with(value),
            Err(e) => CommandOutcome::error(&e),
        }
    }
}
