use crate::cache::InterfaceCache;
use crate::rate_limiter::RateLimiter;
use dashmap::DashMap;
use pricewatch_core::{
    CacheEntry, ContractAbiResponse, ContractAddress, Error, ExplorerApi, InterfaceDescription,
    RejectionKind, VerificationOutcome,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Texto retornado no `result` quando o contrato não tem código verificado
pub const UNVERIFIED_SENTINEL: &str = "Contract source code not verified";

/// Falhas na resolução da ABI de um endereço
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("código-fonte não verificado")]
    Unverified,

    #[error("falha transitória: {0}")]
    Transient(String),

    #[error("falha fatal: {0}")]
    Fatal(String),
}

impl From<Error> for FetchError {
    fn from(err: Error) -> Self {
        match err {
            Error::UpstreamRejected {
                kind: RejectionKind::Unverified,
                ..
            } => FetchError::Unverified,
            e if e.is_retryable() => FetchError::Transient(e.to_string()),
            e => FetchError::Fatal(e.to_string()),
        }
    }
}

/// Política de novas tentativas para falhas transitórias
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Calcula o atraso para uma tentativa (base * 2^attempt, limitado)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.base_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// Interpreta a resposta de `getabi`
pub fn decode_abi_response(response: &ContractAbiResponse) -> Result<InterfaceDescription, FetchError> {
    if response.is_success() {
        if response.result.contains(UNVERIFIED_SENTINEL) {
            return Err(FetchError::Unverified);
        }
        if response.result.trim().is_empty() {
            return Err(FetchError::Fatal("ABI vazia em resposta de sucesso".to_string()));
        }
        return Ok(InterfaceDescription::new(response.result.clone()));
    }

    let detail = format!("{}: {}", response.message, response.result);
    match RejectionKind::classify(&response.message, &response.result) {
        RejectionKind::Unverified => Err(FetchError::Unverified),
        RejectionKind::Transient => Err(FetchError::Transient(detail)),
        RejectionKind::Fatal => Err(FetchError::Fatal(detail)),
    }
}

/// Resolve endereços em ABIs usando cache, limitador e novas tentativas
pub struct InterfaceFetcher<A> {
    api: A,
    cache: Arc<InterfaceCache>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    in_flight: DashMap<ContractAddress, Arc<Mutex<()>>>,
}

impl<A> InterfaceFetcher<A> {
    pub fn new(
        api: A,
        cache: Arc<InterfaceCache>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            api,
            cache,
            limiter,
            retry,
            in_flight: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &Arc<InterfaceCache> {
        &self.cache
    }

    fn cached(&self, address: &ContractAddress) -> Option<Result<InterfaceDescription, FetchError>> {
        self.cache.get(address).map(entry_outcome)
    }
}

fn entry_outcome(entry: CacheEntry) -> Result<InterfaceDescription, FetchError> {
    match entry.outcome {
        VerificationOutcome::Verified => Ok(entry.description),
        VerificationOutcome::Unverified => Err(FetchError::Unverified),
    }
}

impl<A: ExplorerApi> InterfaceFetcher<A> {
    /// Resolve a ABI de um endereço.
    ///
    /// Chamadas concorrentes para o mesmo endereço são serializadas; apenas a
    /// primeira consulta o upstream quando o resultado é cacheável.
    pub async fn resolve(&self, address: &ContractAddress) -> Result<InterfaceDescription, FetchError> {
        if let Some(hit) = self.cached(address) {
            return hit;
        }

        let lock = self.in_flight.entry(address.clone()).or_default().clone();
        let outcome = {
            let _guard = lock.lock().await;
            // segunda verificação sem contar outra falta nas estatísticas
            match self.cache.peek(address) {
                Some(entry) => entry_outcome(entry),
                None => self.fetch_with_retry(address).await,
            }
        };

        // map + cópia local: ninguém mais aguardando
        self.in_flight
            .remove_if(address, |_, l| Arc::strong_count(l) <= 2);
        outcome
    }

    async fn fetch_with_retry(&self, address: &ContractAddress) -> Result<InterfaceDescription, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(address).await {
                Err(FetchError::Transient(msg)) if attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff(attempt);
                    attempt += 1;
                    warn!(
                        "Falha transitória ao obter ABI de {} (tentativa {}/{}), repetindo em {:?}: {}",
                        address, attempt, self.retry.max_retries, delay, msg
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn fetch_once(&self, address: &ContractAddress) -> Result<InterfaceDescription, FetchError> {
        self.limiter.acquire().await;
        let response = self.api.contract_abi(address).await?;

        match decode_abi_response(&response) {
            Ok(description) => {
                if !self.cache.put(address.clone(), description.clone(), VerificationOutcome::Verified) {
                    if let Some(entry) = self.cache.peek(address) {
                        return entry_outcome(entry);
                    }
                }
                Ok(description)
            }
            Err(FetchError::Unverified) => {
                info!("Contrato {} sem código-fonte verificado", address);
                self.cache.put(
                    address.clone(),
                    InterfaceDescription::new(response.result),
                    VerificationOutcome::Unverified,
                );
                Err(FetchError::Unverified)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: &str, message: &str, result: &str) -> ContractAbiResponse {
        ContractAbiResponse {
            status: status.into(),
            message: message.into(),
            result: result.into(),
        }
    }

    #[test]
    fn decode_success() {
        let d = decode_abi_response(&response("1", "OK", r#"[{"name":"getPrice"}]"#)).unwrap();
        assert_eq!(d.as_str(), r#"[{"name":"getPrice"}]"#);
    }

    #[test]
    fn decode_rejections() {
        assert_eq!(
            decode_abi_response(&response("0", "NOTOK", UNVERIFIED_SENTINEL)),
            Err(FetchError::Unverified)
        );
        assert!(matches!(
            decode_abi_response(&response("0", "NOTOK", "Max rate limit reached")),
            Err(FetchError::Transient(_))
        ));
        assert!(matches!(
            decode_abi_response(&response("0", "NOTOK", "Invalid API Key")),
            Err(FetchError::Fatal(_))
        ));
    }

    #[test]
    fn decode_success_with_sentinel_is_unverified() {
        assert_eq!(
            decode_abi_response(&response("1", "OK", UNVERIFIED_SENTINEL)),
            Err(FetchError::Unverified)
        );
        assert!(matches!(
            decode_abi_response(&response("1", "OK", "")),
            Err(FetchError::Fatal(_))
        ));
    }

    #[test]
    fn transport_errors_map_to_transient() {
        assert!(matches!(
            FetchError::from(Error::TransportError("connection reset".into())),
            FetchError::Transient(_)
        ));
        assert!(matches!(
            FetchError::from(Error::DecodeError("eof".into())),
            FetchError::Fatal(_)
        ));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let p = RetryPolicy {
            max_retries: 5,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(p.backoff(0), Duration::from_millis(100));
        assert_eq!(p.backoff(1), Duration::from_millis(200));
        assert_eq!(p.backoff(2), Duration::from_millis(350));
        assert_eq!(p.backoff(40), Duration::from_millis(350));
    }
}
