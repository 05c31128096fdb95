use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    // ---- compilation ----
    #[error("field `{field}` repeats over `{variable}`, but no such variable was given")]
    MissingRepetitionVariable { field: String, variable: String },

    #[error("field `{field}` repeats over `{variable}`, which is not a repetition group")]
    NotARepetitionGroup { field: String, variable: String },

    #[error("field `{field}` is inlined and has no variable name to repeat over")]
    RepeatOnInlineField { field: String },

    #[error("variable `${name}` is given more than once after repetition groups are flattened")]
    VariableCollision { name: String },

    #[error("variable `${variable}` has no GraphQL type: {reason}")]
    UnrepresentableArgument { variable: String, reason: String },

    // ---- response ----
    #[error("cannot fold repetitions into `{key}`: it already holds a non-list value")]
    FoldCollision { key: String },

    #[error("response data must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("at JSON path {path} → {message}")]
    Decode { path: String, message: String },

    // ---- collaborators ----
    #[error("transport: {0}")]
    Transport(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn unrepresentable(variable: &str, reason: impl Into<String>) -> Self {
        Self::UnrepresentableArgument {
            variable: variable.to_string(),
            reason: reason.into(),
        }
    }
}

/// Short JSON kind label for error messages.
pub(crate) fn json_kind(v: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
