use thiserror::Error;

use stocktake_core::DomainError;
use stocktake_workflow::PortError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not build HTTP client: {0}")]
    Build(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(#[from] DomainError),
}

impl From<ClientError> for PortError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(e) if e.is_decode() => PortError::Decode(e.to_string()),
            ClientError::Build(msg) => PortError::Unavailable(msg),
            ClientError::Transport(e) => PortError::Unavailable(e.to_string()),
            ClientError::Status { status, body } => PortError::Rejected { status, message: body },
            ClientError::Decode(msg) => PortError::Decode(msg),
            ClientError::InvalidCatalog(e) => PortError::Decode(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_become_rejections() {
        let err = ClientError::Status {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(
            PortError::from(err),
            PortError::Rejected {
                status: 404,
                message: "not found".to_string()
            }
        );
    }

    #[test]
    fn invalid_catalog_is_a_decode_error() {
        let err = ClientError::InvalidCatalog(DomainError::invariant("duplicate material 3"));
        assert!(matches!(PortError::from(err), PortError::Decode(_)));
    }
}
