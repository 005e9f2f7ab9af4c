/*!
 * PriceWatch Etherscan
 *
 * Cliente para os endpoints de bloco pendente e de ABI de contratos
 * de uma API compatível com Etherscan
 */

use async_trait::async_trait;
use pricewatch_core::{
    ContractAbiResponse, ContractAddress, Error, ExplorerApi, PendingTransaction, RejectionKind,
    Result,
};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Endpoint padrão (Goerli)
pub const DEFAULT_API_URL: &str = "https://api-goerli.etherscan.io/api";

/// Configuração do cliente Etherscan
#[derive(Clone)]
pub struct EtherscanConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for EtherscanConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl EtherscanConfig {
    /// Cria uma configuração padrão com a credencial informada
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

// Não expõe a credencial em logs
impl std::fmt::Debug for EtherscanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtherscanConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Deserialize)]
struct BlockResponse {
    #[serde(default)]
    result: Option<BlockResultField>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
    #[serde(default)]
    message: Option<String>,
}

/// O campo `result` pode vir como bloco ou como aviso textual
#[derive(Deserialize)]
#[serde(untagged)]
enum BlockResultField {
    Block(BlockResult),
    Notice(String),
}

#[derive(Deserialize)]
struct BlockResult {
    #[serde(default)]
    transactions: Vec<PendingTransaction>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    message: String,
}

/// Cliente HTTP para a API Etherscan
pub struct EtherscanClient {
    client: Client,
    config: EtherscanConfig,
}

impl EtherscanClient {
    /// Cria um novo cliente
    pub fn new(config: EtherscanConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::TransportError(format!("Falha ao criar cliente HTTP: {}", e)))?;

        Ok(Self { client, config })
    }

    async fn get_json<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T> {
        let resp = self
            .client
            .get(&self.config.base_url)
            .query(params)
            .query(&[("apikey", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(map_request_error)?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::UpstreamRejected {
                kind: RejectionKind::Fatal,
                message: format!("HTTP {}", status),
            });
        }
        if !status.is_success() {
            return Err(Error::TransportError(format!("HTTP {}", status)));
        }

        let body = resp.text().await.map_err(map_request_error)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::DecodeError(format!("Resposta inválida do upstream: {}", e)))
    }
}

fn map_request_error(e: reqwest::Error) -> Error {
    // a URL contém a apikey
    let e = e.without_url();
    if e.is_timeout() {
        Error::TimeoutError(e.to_string())
    } else {
        Error::TransportError(e.to_string())
    }
}

#[async_trait]
impl ExplorerApi for EtherscanClient {
    async fn pending_transactions(&self) -> Result<Vec<PendingTransaction>> {
        let response: BlockResponse = self
            .get_json(&[
                ("module", "proxy"),
                ("action", "eth_getBlockByNumber"),
                ("tag", "pending"),
                ("boolean", "true"),
            ])
            .await?;

        if let Some(err) = response.error {
            return Err(Error::UpstreamRejected {
                kind: RejectionKind::Transient,
                message: err.message,
            });
        }

        match response.result {
            Some(BlockResultField::Block(block)) => {
                debug!("Bloco pendente com {} transações", block.transactions.len());
                Ok(block.transactions)
            }
            Some(BlockResultField::Notice(notice)) => {
                let message = response.message.unwrap_or_default();
                Err(Error::UpstreamRejected {
                    kind: RejectionKind::classify(&message, &notice),
                    message: notice,
                })
            }
            None => Ok(Vec::new()),
        }
    }

    async fn contract_abi(&self, address: &ContractAddress) -> Result<ContractAbiResponse> {
        self.get_json(&[
            ("module", "contract"),
            ("action", "getabi"),
            ("address", address.as_str()),
        ])
        .await
    }
}
