use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("corrupt store {path}: {reason}")]
    CorruptStore { path: String, reason: String },
    #[error("storage read failed: {0}")]
    StorageReadFailed(String),
    #[error("storage write failed: {0}")]
    StorageWriteFailed(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::Conflict(_) => 1002,
            ServiceError::NotFound(_) => 1003,
            ServiceError::CorruptStore { .. } => 1201,
            ServiceError::StorageReadFailed(_) => 1202,
            ServiceError::StorageWriteFailed(_) => 1203,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_kind() {
        let all = [
            ServiceError::validation("x"),
            ServiceError::not_found("product"),
            ServiceError::Conflict("x".into()),
            ServiceError::CorruptStore { path: "p".into(), reason: "r".into() },
            ServiceError::StorageReadFailed("x".into()),
            ServiceError::StorageWriteFailed("x".into()),
        ];
        let mut codes: Vec<u16> = all.iter().map(ServiceError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn not_found_names_the_entity() {
        assert_eq!(ServiceError::not_found("product").to_string(), "not found: product not found");
    }
}
