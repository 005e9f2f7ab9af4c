/// Nomes de funções de preço mais comuns
pub const DEFAULT_PRICE_FUNCTIONS: &[&str] = &["getPrice", "price", "currentPrice", "fetchPrice"];

/// Separa uma lista de termos por vírgulas; termos vazios são ignorados
pub fn parse_vocabulary(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Classificador de ABIs por vocabulário de funções de preço.
///
/// A busca é por substring, sensível a maiúsculas, sobre o texto bruto da ABI.
/// "price" também casa com identificadores como `priceFeed` ou `priceOracle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    vocabulary: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_PRICE_FUNCTIONS.iter().copied())
    }
}

impl Classifier {
    pub fn new<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            vocabulary: vocabulary.into_iter().map(Into::into).collect(),
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Indica se o texto contém algum termo do vocabulário
    pub fn classify(&self, description: &str) -> bool {
        self.vocabulary.iter().any(|term| description.contains(term.as_str()))
    }

    /// Termos do vocabulário presentes no texto
    pub fn matched_terms<'a>(&'a self, description: &str) -> Vec<&'a str> {
        self.vocabulary
            .iter()
            .filter(|term| description.contains(term.as_str()))
            .map(String::as_str)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_price_function() {
        let c = Classifier::default();
        assert!(c.classify(r#"[{"name":"getPrice","type":"function"}]"#));
        assert!(!c.classify(r#"[{"name":"latestPriceFeed"}]"#));
        assert!(!c.classify(r#"[{"name":"transfer","type":"function"}]"#));
    }

    #[test]
    fn case_sensitive() {
        let c = Classifier::default();
        assert!(!c.classify(r#"[{"name":"Price"}]"#));
        assert!(c.classify(r#"[{"name":"price"}]"#));
    }

    #[test]
    fn loose_substring_match_is_kept() {
        let c = Classifier::default();
        // "priceFeed" contém "price"
        assert!(c.classify(r#"[{"name":"priceFeed"}]"#));
        assert_eq!(c.matched_terms("getPrice"), vec!["getPrice"]);
        assert_eq!(c.matched_terms("fetchPrice price"), vec!["price", "fetchPrice"]);
    }

    #[test]
    fn custom_vocabulary() {
        let c = Classifier::new(parse_vocabulary(" latestAnswer, ,getReserves "));
        assert_eq!(c.vocabulary(), &["latestAnswer".to_string(), "getReserves".to_string()]);
        assert!(c.classify("latestAnswer()"));
        assert!(!c.classify("getPrice()"));
    }

    #[test]
    fn vocabulary_list_parsing() {
        assert_eq!(parse_vocabulary("a, b,,c "), vec!["a", "b", "c"]);
        assert!(parse_vocabulary(" , ").is_empty());
    }

    #[test]
    fn empty_vocabulary_never_matches() {
        let c = Classifier::new(parse_vocabulary(""));
        assert!(!c.classify("getPrice"));
    }
}
