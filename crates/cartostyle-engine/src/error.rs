use thiserror::Error;

/// Errors raised by the layout, blend, texture and model lifecycle layers.
///
/// Every variant is fatal to the operation that raised it. Nothing in this
/// crate retries or downgrades these; the owning layer decides whether to
/// disable itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// An operation was invoked out of lifecycle order, or a variant broke
    /// the model contract (programming error).
    #[error("model contract violation: {0}")]
    ContractViolation(String),

    /// The layer config names a blend mode outside the recognized set.
    #[error("unknown blend mode `{0}`")]
    UnknownBlendMode(String),

    /// A collaborator required at construction was not provided.
    #[error("required service `{0}` is not available")]
    MissingService(&'static str),

    /// The renderer backend failed to create a GPU resource.
    #[error("GPU resource error: {0}")]
    Resource(String),
}

impl ModelError {
    pub(crate) fn contract(msg: impl Into<String>) -> Self {
        Self::ContractViolation(msg.into())
    }

    pub(crate) fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Returns `true` for errors that indicate a bug in calling code rather
    /// than bad input or an exhausted backend.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::ContractViolation(_))
    }
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;
