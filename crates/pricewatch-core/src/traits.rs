/*!
 * PriceWatch Traits
 *
 * Traits comuns usados em toda a workspace PriceWatch
 */

use async_trait::async_trait;
use crate::error::Result;
use crate::types::{ContractAbiResponse, ContractAddress, PendingTransaction};
use std::sync::Arc;

/// Trait para provedores de dados de block explorer
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    /// Lista as transações do bloco pendente
    async fn pending_transactions(&self) -> Result<Vec<PendingTransaction>>;

    /// Obtém a ABI de um contrato, sem interpretar o status
    async fn contract_abi(&self, address: &ContractAddress) -> Result<ContractAbiResponse>;
}

#[async_trait]
impl<T: ExplorerApi + ?Sized> ExplorerApi for Arc<T> {
    async fn pending_transactions(&self) -> Result<Vec<PendingTransaction>> {
        (**self).pending_transactions().await
    }

    async fn contract_abi(&self, address: &ContractAddress) -> Result<ContractAbiResponse> {
        (**self).contract_abi(address).await
    }
}
