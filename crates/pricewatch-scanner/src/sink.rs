use pricewatch_core::{ClassificationResult, Error, InterfaceDescription, Result};
use serde::Serialize;
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;

/// Formato das linhas emitidas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Formato de saída desconhecido: {}", other)),
        }
    }
}

/// Quais resultados são emitidos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitMode {
    /// Apenas endereços com funções de preço
    PriceOnly,
    /// Todos os endereços resolvidos
    All,
}

impl EmitMode {
    pub fn accepts(&self, result: &ClassificationResult) -> bool {
        match self {
            EmitMode::PriceOnly => result.is_price_related,
            EmitMode::All => true,
        }
    }
}

impl FromStr for EmitMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "price" | "price-only" => Ok(EmitMode::PriceOnly),
            "all" => Ok(EmitMode::All),
            other => Err(format!("Modo de emissão desconhecido: {}", other)),
        }
    }
}

/// Destino dos resultados de classificação
pub trait ResultSink: Send + Sync {
    fn emit(&self, result: &ClassificationResult, description: &InterfaceDescription) -> Result<()>;
}

impl<T: ResultSink + ?Sized> ResultSink for Arc<T> {
    fn emit(&self, result: &ClassificationResult, description: &InterfaceDescription) -> Result<()> {
        (**self).emit(result, description)
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(flatten)]
    result: &'a ClassificationResult,
    sample: String,
}

/// Emite uma linha por resultado na saída padrão
pub struct StdoutSink {
    format: OutputFormat,
    sample_chars: usize,
}

impl StdoutSink {
    pub fn new(format: OutputFormat, sample_chars: usize) -> Self {
        Self { format, sample_chars }
    }

    /// Formata o resultado sem quebra de linha final
    pub fn format_line(
        &self,
        result: &ClassificationResult,
        description: &InterfaceDescription,
    ) -> Result<String> {
        let sample = description.sample(self.sample_chars);
        match self.format {
            OutputFormat::Text => Ok(format!(
                "{} {} {}",
                result.address, result.is_price_related, sample
            )),
            OutputFormat::Json => serde_json::to_string(&JsonLine { result, sample })
                .map_err(|e| Error::Other(format!("Falha ao serializar resultado: {}", e))),
        }
    }
}

impl ResultSink for StdoutSink {
    fn emit(&self, result: &ClassificationResult, description: &InterfaceDescription) -> Result<()> {
        let line = self.format_line(result, description)?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", line)
            .and_then(|_| out.flush())
            .map_err(|e| Error::Other(format!("Falha ao escrever resultado: {}", e)))
    }
}
