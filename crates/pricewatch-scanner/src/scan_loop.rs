use crate::cache::InterfaceCache;
use crate::classifier::Classifier;
use crate::config::ScannerConfig;
use crate::fetcher::{FetchError, InterfaceFetcher};
use crate::pool::{PendingPoolScanner, PendingTarget};
use crate::rate_limiter::RateLimiter;
use crate::sink::{EmitMode, ResultSink};
use futures::stream::{self, StreamExt};
use pricewatch_core::{ClassificationResult, ExplorerApi, InterfaceDescription, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Fase atual do ciclo de varredura
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Scanning,
    Resolving,
    Emitting,
}

/// Resumo de um ciclo concluído
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub pending_targets: usize,
    pub resolved: usize,
    pub unverified: usize,
    pub failed: usize,
    pub emitted: usize,
    pub cache_hits: usize,
}

#[derive(Debug, Clone)]
struct LoopSettings {
    concurrency: usize,
    emit_mode: EmitMode,
    cycle_delay: Duration,
    min_cycle_backoff: Duration,
    max_cycle_backoff: Duration,
}

/// Orquestra varredura, resolução, classificação e emissão
pub struct ScanLoop<A, S> {
    scanner: PendingPoolScanner<Arc<A>>,
    fetcher: InterfaceFetcher<Arc<A>>,
    cache: Arc<InterfaceCache>,
    classifier: Classifier,
    sink: S,
    settings: LoopSettings,
    phase: ScanPhase,
    cycles: u64,
    consecutive_failures: u32,
}

impl<A: ExplorerApi, S: ResultSink> ScanLoop<A, S> {
    /// Monta o loop com cache e limitador próprios
    pub fn new(api: A, sink: S, config: &ScannerConfig) -> Self {
        let api = Arc::new(api);
        let cache = Arc::new(InterfaceCache::new(config.cache_capacity, config.negative_ttl));
        let limiter = Arc::new(RateLimiter::new(config.request_interval));

        Self {
            scanner: PendingPoolScanner::new(Arc::clone(&api)),
            fetcher: InterfaceFetcher::new(api, Arc::clone(&cache), limiter, config.retry_policy()),
            cache,
            classifier: Classifier::new(config.price_functions.iter().cloned()),
            sink,
            settings: LoopSettings {
                concurrency: config.concurrency.max(1),
                emit_mode: config.emit_mode,
                cycle_delay: config.cycle_delay,
                min_cycle_backoff: config.min_cycle_backoff,
                max_cycle_backoff: config.max_cycle_backoff,
            },
            phase: ScanPhase::Idle,
            cycles: 0,
            consecutive_failures: 0,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles
    }

    pub fn cache(&self) -> &Arc<InterfaceCache> {
        &self.cache
    }

    /// Executa um ciclo completo. Falha apenas se a listagem da mempool falhar.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.phase = ScanPhase::Scanning;
        let targets = match self.scanner.scan().await {
            Ok(t) => t,
            Err(e) => {
                self.phase = ScanPhase::Idle;
                return Err(e);
            }
        };

        self.phase = ScanPhase::Resolving;
        let mut report = CycleReport {
            pending_targets: targets.len(),
            ..Default::default()
        };
        let hits_before = self.cache.stats().hits;

        let fetcher = &self.fetcher;
        let outcomes: Vec<(PendingTarget, std::result::Result<InterfaceDescription, FetchError>)> =
            stream::iter(targets)
                .map(|target| async move {
                    let outcome = fetcher.resolve(&target.address).await;
                    (target, outcome)
                })
                .buffer_unordered(self.settings.concurrency)
                .collect()
                .await;

        report.cache_hits = self.cache.stats().hits.saturating_sub(hits_before);

        let mut ready = Vec::new();
        for (target, outcome) in outcomes {
            match outcome {
                Ok(description) => {
                    report.resolved += 1;
                    let is_price_related = self.classifier.classify(description.as_str());
                    if is_price_related {
                        debug!(
                            "{} contém funções de preço: {:?}",
                            target.address,
                            self.classifier.matched_terms(description.as_str())
                        );
                    }
                    let result = ClassificationResult {
                        is_price_related,
                        address: target.address,
                        transaction_hash: target.transaction_hash,
                    };
                    ready.push((result, description));
                }
                Err(FetchError::Unverified) => {
                    report.unverified += 1;
                    debug!("Ignorando {}: código-fonte não verificado", target.address);
                }
                Err(e) => {
                    report.failed += 1;
                    warn!("Falha ao resolver ABI de {}: {}", target.address, e);
                }
            }
        }

        // sem pontos de suspensão daqui até o fim do ciclo
        self.phase = ScanPhase::Emitting;
        for (result, description) in &ready {
            if !self.settings.emit_mode.accepts(result) {
                continue;
            }
            match self.sink.emit(result, description) {
                Ok(()) => report.emitted += 1,
                Err(e) => error!("Falha ao emitir resultado de {}: {}", result.address, e),
            }
        }

        self.phase = ScanPhase::Idle;
        self.cycles += 1;
        Ok(report)
    }

    /// Atraso antes do próximo ciclo, com backoff exponencial após falhas
    fn next_delay(&self) -> Duration {
        if self.consecutive_failures == 0 {
            return self.settings.cycle_delay;
        }
        let exp = (self.consecutive_failures - 1).min(16);
        self.settings
            .cycle_delay
            .max(self.settings.min_cycle_backoff)
            .saturating_mul(2u32.pow(exp))
            .min(self.settings.max_cycle_backoff)
    }

    /// Executa ciclos até o sinal de encerramento.
    ///
    /// Um ciclo interrompido não emite nenhum resultado.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Iniciando varredura da mempool | vocabulário={:?}",
            self.classifier.vocabulary()
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => None,
                outcome = self.run_cycle() => Some(outcome),
            };

            let outcome = match outcome {
                Some(outcome) => outcome,
                None => {
                    info!(
                        "Encerramento solicitado, abortando ciclo em andamento (fase {:?})",
                        self.phase()
                    );
                    break;
                }
            };

            match outcome {
                Ok(report) => {
                    self.consecutive_failures = 0;
                    info!(
                        "Ciclo {} concluído | destinos={} resolvidos={} não_verificados={} falhas={} emitidos={} cache_hits={}",
                        self.cycles,
                        report.pending_targets,
                        report.resolved,
                        report.unverified,
                        report.failed,
                        report.emitted,
                        report.cache_hits,
                    );
                }
                Err(e) => {
                    self.consecutive_failures += 1;
                    error!(
                        "Falha ao listar a mempool ({} consecutivas): {}",
                        self.consecutive_failures, e
                    );
                }
            }

            let delay = self.next_delay();
            tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.phase = ScanPhase::Idle;
        info!("Varredura encerrada após {} ciclos", self.cycles);
    }
}

/// Resolve quando o valor do canal passa a `true`. Emissor descartado nunca encerra.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            futures::future::pending::<()>().await;
        }
    }
}
