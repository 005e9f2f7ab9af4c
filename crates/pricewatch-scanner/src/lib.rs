/*!
 * PriceWatch Scanner
 *
 * Varredura periódica do bloco pendente, resolução de ABIs com cache e
 * limite de taxa, e classificação de contratos com funções de preço.
 */

mod cache;
mod classifier;
mod config;
mod fetcher;
mod pool;
mod rate_limiter;
mod scan_loop;
mod sink;

pub use cache::*;
pub use classifier::*;
pub use config::*;
pub use fetcher::*;
pub use pool::*;
pub use rate_limiter::*;
pub use scan_loop::*;
pub use sink::*;
