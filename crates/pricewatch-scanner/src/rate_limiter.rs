use tokio::sync::Mutex;
use tokio::time::{sleep_until, Duration, Instant};

/// Espaçamento padrão entre chamadas ao upstream
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(200);

/// Limitador global de chamadas ao upstream.
///
/// Cada `acquire` reserva o próximo slot livre, separado do anterior por
/// `min_interval`. A fila do `Mutex` do tokio é FIFO.
pub struct RateLimiter {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Aguarda até que uma chamada seja permitida e retorna o instante concedido
    pub async fn acquire(&self) -> Instant {
        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(t) if t > now => t,
                _ => now,
            };
            *next = Some(slot + self.min_interval);
            slot
        };

        sleep_until(slot).await;
        slot
    }
}
