pub type Result<T> = std::result::Result<T, Error>;

/// Caller-usage errors raised while recording a diagram.
///
/// None of these are environmental: each one names the operation that broke the nesting
/// discipline, and the offending operation leaves the session untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Unbalanced scope: {message}")]
    UnbalancedScope { message: String },

    #[error("Duplicate return for call `{call}`: a return was already recorded for this call")]
    DuplicateReturn { call: String },

    #[error("No active call to return from (innermost scope: {innermost})")]
    NoActiveCall { innermost: String },

    #[error("No active fragment for branch `{label}` (innermost scope: {innermost})")]
    NoActiveFragment { label: String, innermost: String },

    #[error("Unknown actor `{name}`: actors must be created in the same diagram session")]
    UnknownActor { name: String },

    #[error("Actor `{name}` is already declared in this diagram")]
    DuplicateActor { name: String },

    #[error("Actor `{name}` was destroyed and cannot take part in `{method}`")]
    DestroyedActor { name: String, method: String },

    #[error("No current object: enter an object or open a call before `{operation}`")]
    NoCurrentObject { operation: String },

    #[error("Invalid {what}: must be a non-empty string")]
    EmptyName { what: &'static str },
}
