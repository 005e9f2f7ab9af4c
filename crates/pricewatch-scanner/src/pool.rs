use pricewatch_core::{ContractAddress, ExplorerApi, PendingTransaction, Result, TransactionHash};
use std::collections::HashMap;
use tracing::debug;

/// Endereço de destino distinto observado no bloco pendente
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTarget {
    pub address: ContractAddress,
    /// Primeira transação vista para o endereço
    pub transaction_hash: TransactionHash,
    pub occurrences: usize,
}

/// Lista o bloco pendente e extrai destinos distintos
pub struct PendingPoolScanner<A> {
    api: A,
}

impl<A> PendingPoolScanner<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }
}

impl<A: ExplorerApi> PendingPoolScanner<A> {
    /// Busca as transações pendentes e retorna os destinos deduplicados
    pub async fn scan(&self) -> Result<Vec<PendingTarget>> {
        let txs = self.api.pending_transactions().await?;
        let total = txs.len();
        let targets = dedup_targets(txs);
        debug!("Mempool: {} transações, {} destinos distintos", total, targets.len());
        Ok(targets)
    }
}

/// Agrupa transações por destino normalizado, na ordem da primeira aparição.
/// Destinos vazios, ausentes ou inválidos são descartados.
pub fn dedup_targets(txs: Vec<PendingTransaction>) -> Vec<PendingTarget> {
    let mut index: HashMap<ContractAddress, usize> = HashMap::new();
    let mut targets: Vec<PendingTarget> = Vec::new();

    for tx in txs {
        let raw = match tx.destination_address.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => continue,
        };
        let address = match ContractAddress::parse(raw) {
            Some(a) => a,
            None => {
                debug!("Destino inválido ignorado: {} (tx {})", raw, tx.transaction_hash);
                continue;
            }
        };

        match index.get(&address) {
            Some(&pos) => targets[pos].occurrences += 1,
            None => {
                index.insert(address.clone(), targets.len());
                targets.push(PendingTarget {
                    address,
                    transaction_hash: tx.transaction_hash,
                    occurrences: 1,
                });
            }
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(to: Option<&str>, hash: &str) -> PendingTransaction {
        PendingTransaction {
            destination_address: to.map(str::to_string),
            transaction_hash: hash.to_string(),
        }
    }

    const A: &str = "0x00000000000000000000000000000000000000aa";
    const A_UPPER: &str = "0x00000000000000000000000000000000000000AA";
    const B: &str = "0x00000000000000000000000000000000000000bb";

    #[test]
    fn dedups_by_normalized_address() {
        let targets = dedup_targets(vec![
            tx(Some(A), "0x01"),
            tx(Some(B), "0x02"),
            tx(Some(A_UPPER), "0x03"),
            tx(Some(A), "0x04"),
        ]);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].address.as_str(), A);
        assert_eq!(targets[0].transaction_hash, "0x01");
        assert_eq!(targets[0].occurrences, 3);
        assert_eq!(targets[1].address.as_str(), B);
        assert_eq!(targets[1].occurrences, 1);
    }

    #[test]
    fn drops_empty_and_invalid_destinations() {
        let targets = dedup_targets(vec![
            tx(None, "0x01"),
            tx(Some(""), "0x02"),
            tx(Some("   "), "0x03"),
            tx(Some("0xnothex"), "0x04"),
            tx(Some(B), "0x05"),
        ]);
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].transaction_hash, "0x05");
    }
}
