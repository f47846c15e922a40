/// Errors raised while resolving a service identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceIdError {
    #[error("service identifier is empty")]
    Empty,

    #[error("service identifier longer than {max} characters")]
    TooLong { max: usize },

    #[error("service identifier contains invalid character {0:?}")]
    InvalidCharacter(char),

    #[error("unknown service: {0}")]
    NotManaged(String),

    #[error("service does not support port toggling: {0}")]
    NotToggleable(String),
}
