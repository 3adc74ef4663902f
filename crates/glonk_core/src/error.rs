use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlonkError {
    #[error("schema error: {message}")]
    Schema { message: String },
    #[error("parse error: {message}")]
    Parse { message: String },
    #[error("arity error: {message}")]
    Arity { message: String },
    #[error("not found: {message}")]
    NotFound { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("decode error: {message}")]
    Decode { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl GlonkError {
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    pub fn arity(message: impl Into<String>) -> Self {
        Self::Arity {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Filter input errors are skipped per filter instead of failing the request.
    pub fn is_filter_input(&self) -> bool {
        matches!(self, Self::Parse { .. } | Self::Arity { .. })
    }
}

pub type GlonkResult<T> = Result<T, GlonkError>;

impl From<sea_orm::DbErr> for GlonkError {
    fn from(value: sea_orm::DbErr) -> Self {
        GlonkError::storage(value.to_string())
    }
}

impl From<serde_json::Error> for GlonkError {
    fn from(value: serde_json::Error) -> Self {
        GlonkError::invalid(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::GlonkError;

    #[test]
    fn helper_constructors_set_variants() {
        assert!(matches!(GlonkError::schema("s"), GlonkError::Schema { .. }));
        assert!(matches!(GlonkError::parse("p"), GlonkError::Parse { .. }));
        assert!(matches!(GlonkError::arity("a"), GlonkError::Arity { .. }));
        assert!(matches!(
            GlonkError::not_found("n"),
            GlonkError::NotFound { .. }
        ));
        assert!(matches!(
            GlonkError::integrity("i"),
            GlonkError::Integrity { .. }
        ));
        assert!(matches!(GlonkError::decode("d"), GlonkError::Decode { .. }));
        assert!(matches!(
            GlonkError::invalid("v"),
            GlonkError::InvalidInput { .. }
        ));
        assert!(matches!(
            GlonkError::storage("disk"),
            GlonkError::Storage { .. }
        ));
    }

    #[test]
    fn only_parse_and_arity_are_filter_input() {
        assert!(GlonkError::parse("x").is_filter_input());
        assert!(GlonkError::arity("x").is_filter_input());
        assert!(!GlonkError::not_found("x").is_filter_input());
        assert!(!GlonkError::storage("x").is_filter_input());
    }
}
