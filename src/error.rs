use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpindleError>;

#[derive(Debug, Error)]
pub enum SpindleError {
    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("Maximum resolution depth exceeded at depth {depth} while resolving {type_name}")]
    DepthExceeded { depth: usize, type_name: String },

    #[error("Ambiguous providers for {type_name}: both an instance and a factory are registered")]
    AmbiguousProvider { type_name: String },

    #[error("No override registered for base type: {type_name}")]
    NoOverride { type_name: String },

    #[error("Type {type_name} is not constructible: {reason}")]
    NotConstructible { type_name: String, reason: String },

    #[error("Internal error: {0}")]
    Internal(String),
}
