/*!
 * PriceWatch Utils
 *
 * Utilitários comuns usados em toda a workspace PriceWatch
 */

/// Verifica se a string é um endereço hex de 20 bytes com prefixo `0x`
pub fn is_hex_address(value: &str) -> bool {
    let hex_str = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(rest) => rest,
        None => return false,
    };
    hex_str.len() == 40 && hex_str.chars().all(|c| c.is_ascii_hexdigit())
}

/// Normaliza um endereço para a forma minúscula com prefixo `0x`
pub fn normalize_address(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if !is_hex_address(trimmed) {
        return None;
    }
    Some(format!("0x{}", trimmed[2..].to_ascii_lowercase()))
}

/// Trunca respeitando limites de caractere
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_address_detection() {
        assert!(is_hex_address("0x0000000000000000000000000000000000000000"));
        assert!(is_hex_address("0XABCDEF0123456789abcdef0123456789abcdef01"));
        assert!(!is_hex_address("0000000000000000000000000000000000000000"));
        assert!(!is_hex_address("0x00000000000000000000000000000000000000"));
    }

    #[test]
    fn truncate_multibyte() {
        assert_eq!(truncate_chars("preço", 4), "preç");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
