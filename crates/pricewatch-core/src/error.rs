use crate::types::RejectionKind;
use thiserror::Error;

/// Erros comuns da biblioteca PriceWatch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Falha de rede, DNS ou HTTP do upstream
    #[error("Erro de transporte: {0}")]
    TransportError(String),

    /// Resposta que não pôde ser decodificada
    #[error("Erro de decodificação: {0}")]
    DecodeError(String),

    /// Upstream respondeu com status diferente de sucesso
    #[error("Rejeitado pelo upstream ({kind}): {message}")]
    UpstreamRejected {
        kind: RejectionKind,
        message: String,
    },

    /// Configuração inválida ou ausente na inicialização
    #[error("Erro de configuração: {0}")]
    ConfigError(String),

    /// Erro de timeout
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// Erro genérico
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Indica se a mesma chamada pode ser repetida com chance de sucesso
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::TransportError(_) | Error::TimeoutError(_) => true,
            Error::UpstreamRejected { kind, .. } => *kind == RejectionKind::Transient,
            _ => false,
        }
    }
}

/// Tipo de resultado usado em toda a biblioteca
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_variants() {
        assert!(Error::TransportError("dns".into()).is_retryable());
        assert!(Error::TimeoutError("30s".into()).is_retryable());
        assert!(Error::UpstreamRejected {
            kind: RejectionKind::Transient,
            message: "Max rate limit reached".into(),
        }
        .is_retryable());

        assert!(!Error::DecodeError("json".into()).is_retryable());
        assert!(!Error::ConfigError("key".into()).is_retryable());
        assert!(!Error::UpstreamRejected {
            kind: RejectionKind::Fatal,
            message: "Invalid API Key".into(),
        }
        .is_retryable());
    }

    #[test]
    fn rejection_message_includes_kind() {
        let err = Error::UpstreamRejected {
            kind: RejectionKind::Unverified,
            message: "Contract source code not verified".into(),
        };
        assert_eq!(
            err.to_string(),
            "Rejeitado pelo upstream (unverified): Contract source code not verified"
        );
    }
}
