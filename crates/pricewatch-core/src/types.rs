/*!
 * PriceWatch Types
 *
 * Tipos comuns usados em toda a workspace PriceWatch
 */

use crate::utils::{normalize_address, truncate_chars};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Alias para hash de transação, mantido como recebido do upstream
pub type TransactionHash = String;

/// Endereço de contrato normalizado (`0x` + 40 dígitos hex minúsculos)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContractAddress(String);

impl ContractAddress {
    /// Normaliza e valida um endereço. Retorna `None` para valores vazios ou inválidos.
    pub fn parse(raw: &str) -> Option<Self> {
        normalize_address(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContractAddress {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("Endereço inválido: {}", value))
    }
}

impl From<ContractAddress> for String {
    fn from(value: ContractAddress) -> Self {
        value.0
    }
}

/// Transação pendente como listada pelo upstream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Campo `to`; ausente em criação de contrato
    #[serde(rename = "to", default)]
    pub destination_address: Option<String>,
    #[serde(rename = "hash")]
    pub transaction_hash: TransactionHash,
}

/// Descrição de interface (ABI) tratada como texto opaco
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterfaceDescription(String);

impl InterfaceDescription {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Trecho de até `max_chars` caracteres em uma única linha, para exibição
    pub fn sample(&self, max_chars: usize) -> String {
        let single_line: String = self
            .0
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        truncate_chars(&single_line, max_chars)
    }
}

impl fmt::Display for InterfaceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resultado da verificação de código-fonte de um contrato
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Verified,
    Unverified,
}

/// Entrada do cache de interfaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub address: ContractAddress,
    pub description: InterfaceDescription,
    pub fetched_at: DateTime<Utc>,
    pub outcome: VerificationOutcome,
}

/// Resultado da classificação de um endereço em um ciclo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub address: ContractAddress,
    pub transaction_hash: TransactionHash,
    pub is_price_related: bool,
}

/// Resposta bruta do endpoint `getabi`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAbiResponse {
    pub status: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub result: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ContractAbiResponse {
    /// Status "1" indica sucesso
    pub fn is_success(&self) -> bool {
        self.status == "1"
    }
}

/// Subdivisão de uma rejeição do upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    /// Código-fonte do contrato não verificado publicamente
    Unverified,
    /// Instabilidade do serviço, elegível para nova tentativa
    Transient,
    /// Resposta malformada ou credencial rejeitada
    Fatal,
}

/// Termos que indicam código-fonte não verificado
const UNVERIFIED_MARKERS: &[&str] = &["not verified"];

/// Termos que indicam limitação temporária do serviço
const TRANSIENT_MARKERS: &[&str] = &[
    "rate limit",
    "max rate",
    "timeout",
    "timed out",
    "busy",
    "try again",
    "temporarily",
    "too many requests",
    "unavailable",
];

impl RejectionKind {
    /// Classifica uma rejeição a partir de `message` e `result` da resposta.
    ///
    /// Mensagens não reconhecidas, incluindo credencial inválida, são fatais.
    pub fn classify(message: &str, result: &str) -> Self {
        let text = format!("{} {}", message, result).to_lowercase();
        if UNVERIFIED_MARKERS.iter().any(|m| text.contains(m)) {
            RejectionKind::Unverified
        } else if TRANSIENT_MARKERS.iter().any(|m| text.contains(m)) {
            RejectionKind::Transient
        } else {
            RejectionKind::Fatal
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionKind::Unverified => write!(f, "unverified"),
            RejectionKind::Transient => write!(f, "transient"),
            RejectionKind::Fatal => write!(f, "fatal"),
        }
    }
}
