use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelgenError {
    #[error("configuration error in {entity}.{field}: {message}")]
    Configuration {
        entity: String,
        field: String,
        message: String,
    },

    #[error("unknown referential action '{value}' on {entity}.{field}")]
    UnknownConstraint {
        entity: String,
        field: String,
        value: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RelgenError>;
