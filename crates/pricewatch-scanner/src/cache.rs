use chrono::Utc;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use pricewatch_core::{CacheEntry, ContractAddress, InterfaceDescription, VerificationOutcome};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Estatísticas de cache
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub inserts: usize,
    pub evictions: usize,
    pub expirations: usize,
}

/// Cache de ABIs por endereço, compartilhado entre os workers.
///
/// A primeira escrita para um endereço prevalece. Entradas `Unverified`
/// expiram após `negative_ttl`; entradas `Verified` só saem por evicção LRU.
pub struct InterfaceCache {
    entries: Mutex<LruCache<ContractAddress, CacheEntry>>,
    stats: RwLock<CacheStats>,
    negative_ttl: Duration,
}

impl InterfaceCache {
    /// Cria um novo cache com capacidade e retenção negativa especificadas
    pub fn new(capacity: usize, negative_ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            stats: RwLock::new(CacheStats::default()),
            negative_ttl,
        }
    }

    fn expired(&self, entry: &CacheEntry) -> bool {
        if entry.outcome != VerificationOutcome::Unverified {
            return false;
        }
        let age = Utc::now()
            .signed_duration_since(entry.fetched_at)
            .to_std()
            .unwrap_or_default();
        age > self.negative_ttl
    }

    /// Obtém a entrada de um endereço
    pub fn get(&self, address: &ContractAddress) -> Option<CacheEntry> {
        let mut entries = self.entries.lock();

        let expired = match entries.get(address) {
            Some(entry) if !self.expired(entry) => {
                self.stats.write().hits += 1;
                return Some(entry.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(address);
            self.stats.write().expirations += 1;
        }
        self.stats.write().misses += 1;
        None
    }

    /// Consulta sem afetar a ordem LRU nem as estatísticas
    pub fn peek(&self, address: &ContractAddress) -> Option<CacheEntry> {
        let entries = self.entries.lock();
        entries
            .peek(address)
            .filter(|entry| !self.expired(entry))
            .cloned()
    }

    /// Armazena o resultado de um endereço. Retorna `false` se já havia entrada válida.
    pub fn put(
        &self,
        address: ContractAddress,
        description: InterfaceDescription,
        outcome: VerificationOutcome,
    ) -> bool {
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.peek(&address) {
            if !self.expired(existing) {
                return false;
            }
        }

        let entry = CacheEntry {
            address: address.clone(),
            description,
            fetched_at: Utc::now(),
            outcome,
        };

        let mut stats = self.stats.write();
        if let Some((evicted, _)) = entries.push(address.clone(), entry) {
            if evicted != address {
                stats.evictions += 1;
            }
        }
        stats.inserts += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Obtém estatísticas do cache
    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> ContractAddress {
        ContractAddress::parse(&format!("0x{:040x}", n)).unwrap()
    }

    #[test]
    fn first_writer_wins() {
        let cache = InterfaceCache::new(16, Duration::from_secs(60));
        assert!(cache.put(addr(1), InterfaceDescription::new("first"), VerificationOutcome::Verified));
        assert!(!cache.put(addr(1), InterfaceDescription::new("second"), VerificationOutcome::Verified));

        let entry = cache.get(&addr(1)).unwrap();
        assert_eq!(entry.description.as_str(), "first");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().inserts, 1);
    }

    #[test]
    fn miss_and_hit_counted() {
        let cache = InterfaceCache::new(16, Duration::from_secs(60));
        assert!(cache.get(&addr(2)).is_none());
        cache.put(addr(2), InterfaceDescription::new("[]"), VerificationOutcome::Verified);
        assert!(cache.get(&addr(2)).is_some());

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn peek_leaves_stats_untouched() {
        let cache = InterfaceCache::new(16, Duration::from_secs(60));
        assert!(cache.peek(&addr(5)).is_none());
        cache.put(addr(5), InterfaceDescription::new("[]"), VerificationOutcome::Verified);
        assert_eq!(cache.peek(&addr(5)).unwrap().description.as_str(), "[]");

        let stats = cache.stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn negative_entry_expires() {
        let cache = InterfaceCache::new(16, Duration::from_millis(1));
        cache.put(addr(3), InterfaceDescription::new("not verified"), VerificationOutcome::Unverified);
        cache.put(addr(4), InterfaceDescription::new("[]"), VerificationOutcome::Verified);
        std::thread::sleep(Duration::from_millis(20));

        assert!(cache.get(&addr(3)).is_none());
        assert!(cache.get(&addr(4)).is_some());
        assert_eq!(cache.stats().expirations, 1);

        // após expirar, o endereço pode ser regravado
        assert!(cache.put(addr(3), InterfaceDescription::new("[]"), VerificationOutcome::Verified));
    }

    #[test]
    fn capacity_bound_evicts_lru() {
        let cache = InterfaceCache::new(2, Duration::from_secs(60));
        cache.put(addr(1), InterfaceDescription::new("a"), VerificationOutcome::Verified);
        cache.put(addr(2), InterfaceDescription::new("b"), VerificationOutcome::Verified);
        cache.get(&addr(1));
        cache.put(addr(3), InterfaceDescription::new("c"), VerificationOutcome::Verified);

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&addr(2)).is_none());
        assert!(cache.get(&addr(1)).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }
}
