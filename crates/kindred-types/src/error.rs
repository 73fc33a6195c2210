use thiserror::Error;

/// Errors raised by persona transitions.
///
/// Both variants are invalid transitions: the active persona is left untouched.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("invalid persona transition: unknown persona '{0}'")]
    UnknownPersona(String),

    #[error("invalid persona transition: '{persona_id}' is cooling down for another {remaining_secs}s")]
    CoolingDown {
        persona_id: String,
        remaining_secs: i64,
    },
}

/// Errors returned by the session flow coordinator.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no active session '{0}'")]
    NoActiveSession(String),

    #[error(transparent)]
    Persona(#[from] PersonaError),
}

/// Errors from repository operations (used by trait definitions in kindred-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}
