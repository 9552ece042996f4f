use thiserror::Error;

pub type RabResult<T> = Result<T, RabError>;

#[derive(Error, Debug)]
pub enum RabError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    /// The container library could not encode the report (.xlsx / .docx)
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Verification failed: {0}")]
    Verification(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
