use crate::classifier::{parse_vocabulary, DEFAULT_PRICE_FUNCTIONS};
use crate::fetcher::RetryPolicy;
use crate::rate_limiter::DEFAULT_REQUEST_INTERVAL;
use crate::sink::{EmitMode, OutputFormat};
use pricewatch_core::{Error, Result};
use pricewatch_etherscan::{EtherscanConfig, DEFAULT_API_URL};
use std::str::FromStr;
use std::time::Duration;

pub const API_KEY_VAR: &str = "ETHERSCAN_API_KEY";
pub const API_URL_VAR: &str = "ETHERSCAN_API_URL";
pub const CONCURRENCY_VAR: &str = "PRICEWATCH_CONCURRENCY";
pub const REQUEST_INTERVAL_VAR: &str = "PRICEWATCH_REQUEST_INTERVAL_MS";
pub const CYCLE_DELAY_VAR: &str = "PRICEWATCH_CYCLE_DELAY_MS";
pub const MAX_RETRIES_VAR: &str = "PRICEWATCH_MAX_RETRIES";
pub const CACHE_CAPACITY_VAR: &str = "PRICEWATCH_CACHE_CAPACITY";
pub const NEGATIVE_TTL_VAR: &str = "PRICEWATCH_NEGATIVE_TTL_SECS";
pub const EMIT_VAR: &str = "PRICEWATCH_EMIT";
pub const OUTPUT_VAR: &str = "PRICEWATCH_OUTPUT";
pub const PRICE_FUNCTIONS_VAR: &str = "PRICEWATCH_PRICE_FUNCTIONS";

/// Configuração do scanner
#[derive(Clone)]
pub struct ScannerConfig {
    /// Endpoint da API compatível com Etherscan
    pub api_url: String,
    /// Credencial enviada como `apikey`
    pub api_key: String,
    /// Timeout de cada requisição HTTP
    pub http_timeout: Duration,
    /// Workers concorrentes por ciclo
    pub concurrency: usize,
    /// Espaçamento mínimo entre chamadas ao upstream
    pub request_interval: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub max_retry_backoff: Duration,
    /// Pausa entre ciclos bem-sucedidos
    pub cycle_delay: Duration,
    /// Base do backoff após ciclos com falha, mesmo com `cycle_delay` zero
    pub min_cycle_backoff: Duration,
    /// Limite do backoff após ciclos com falha
    pub max_cycle_backoff: Duration,
    pub cache_capacity: usize,
    /// Retenção de entradas de contratos não verificados
    pub negative_ttl: Duration,
    pub emit_mode: EmitMode,
    pub output_format: OutputFormat,
    /// Tamanho do trecho de ABI exibido
    pub sample_chars: usize,
    pub price_functions: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            http_timeout: Duration::from_secs(30),
            concurrency: 8,
            request_interval: DEFAULT_REQUEST_INTERVAL,
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
            max_retry_backoff: Duration::from_secs(10),
            cycle_delay: Duration::from_secs(1),
            min_cycle_backoff: Duration::from_secs(1),
            max_cycle_backoff: Duration::from_secs(60),
            cache_capacity: 100_000,
            negative_ttl: Duration::from_secs(3600),
            emit_mode: EmitMode::PriceOnly,
            output_format: OutputFormat::Text,
            sample_chars: 120,
            price_functions: DEFAULT_PRICE_FUNCTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl std::fmt::Debug for ScannerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScannerConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"***")
            .field("concurrency", &self.concurrency)
            .field("request_interval", &self.request_interval)
            .field("max_retries", &self.max_retries)
            .field("cycle_delay", &self.cycle_delay)
            .field("min_cycle_backoff", &self.min_cycle_backoff)
            .field("cache_capacity", &self.cache_capacity)
            .field("negative_ttl", &self.negative_ttl)
            .field("emit_mode", &self.emit_mode)
            .field("output_format", &self.output_format)
            .field("price_functions", &self.price_functions)
            .finish()
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::ConfigError(format!("{} inválido ({}): {}", name, value, e)))
}

impl ScannerConfig {
    /// Carrega a configuração das variáveis de ambiente
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Carrega a configuração a partir de uma função de consulta
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::ConfigError(format!("{} não definida", API_KEY_VAR)))?;

        let mut config = Self {
            api_key,
            ..Default::default()
        };

        if let Some(v) = lookup(API_URL_VAR) {
            config.api_url = v.trim().to_string();
        }
        if let Some(v) = lookup(CONCURRENCY_VAR) {
            config.concurrency = parse_var(CONCURRENCY_VAR, &v)?;
            if config.concurrency == 0 {
                return Err(Error::ConfigError(format!("{} deve ser maior que zero", CONCURRENCY_VAR)));
            }
        }
        if let Some(v) = lookup(REQUEST_INTERVAL_VAR) {
            config.request_interval = Duration::from_millis(parse_var(REQUEST_INTERVAL_VAR, &v)?);
        }
        if let Some(v) = lookup(CYCLE_DELAY_VAR) {
            config.cycle_delay = Duration::from_millis(parse_var(CYCLE_DELAY_VAR, &v)?);
        }
        if let Some(v) = lookup(MAX_RETRIES_VAR) {
            config.max_retries = parse_var(MAX_RETRIES_VAR, &v)?;
        }
        if let Some(v) = lookup(CACHE_CAPACITY_VAR) {
            config.cache_capacity = parse_var(CACHE_CAPACITY_VAR, &v)?;
        }
        if let Some(v) = lookup(NEGATIVE_TTL_VAR) {
            config.negative_ttl = Duration::from_secs(parse_var(NEGATIVE_TTL_VAR, &v)?);
        }
        if let Some(v) = lookup(EMIT_VAR) {
            config.emit_mode = parse_var(EMIT_VAR, &v)?;
        }
        if let Some(v) = lookup(OUTPUT_VAR) {
            config.output_format = parse_var(OUTPUT_VAR, &v)?;
        }
        if let Some(v) = lookup(PRICE_FUNCTIONS_VAR) {
            config.price_functions = parse_vocabulary(&v);
        }

        Ok(config)
    }

    pub fn etherscan(&self) -> EtherscanConfig {
        EtherscanConfig {
            base_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            timeout: self.http_timeout,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_backoff: self.retry_backoff,
            max_backoff: self.max_retry_backoff,
        }
    }
}
