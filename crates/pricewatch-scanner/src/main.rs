use anyhow::Context;
use pricewatch_etherscan::EtherscanClient;
use pricewatch_scanner::{ScanLoop, ScannerConfig, StdoutSink};
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout fica reservado para os resultados
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let config = ScannerConfig::from_env().context("Configuração inválida")?;
    info!("Configuração carregada: {:?}", config);

    let client = EtherscanClient::new(config.etherscan()).context("Falha ao criar cliente HTTP")?;
    let sink = StdoutSink::new(config.output_format, config.sample_chars);
    let mut scan_loop = ScanLoop::new(client, sink, &config);

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Sinal de interrupção recebido");
                let _ = tx.send(true);
            }
            Err(e) => error!("Falha ao escutar sinal de interrupção: {}", e),
        }
    });

    scan_loop.run(rx).await;
    Ok(())
}
