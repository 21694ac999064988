//! Ticker universe: local exchange codes normalized into provider symbols.

use crate::domain::symbol::Symbol;
use std::collections::HashSet;

pub const DEFAULT_CODE_COLUMN: &str = "Código";
pub const DEFAULT_MARKET_SUFFIX: &str = ".SA";
pub const DEFAULT_DELIMITER: u8 = b';';

/// How to read the universe file and normalize its codes.
#[derive(Debug, Clone, PartialEq)]
pub struct UniverseSpec {
    pub column: String,
    pub suffix: String,
    pub delimiter: u8,
}

impl Default for UniverseSpec {
    fn default() -> Self {
        Self {
            column: DEFAULT_CODE_COLUMN.to_string(),
            suffix: DEFAULT_MARKET_SUFFIX.to_string(),
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Universe {
    pub symbols: Vec<Symbol>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.symbols.len()
    }

    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.symbols.contains(symbol)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,
}

/// Delimiter from config: a single ASCII character or a name, since `;`
/// starts a comment in INI files.
pub fn parse_delimiter(value: &str) -> Option<u8> {
    match value.trim().to_lowercase().as_str() {
        "semicolon" => Some(b';'),
        "comma" => Some(b','),
        "tab" => Some(b'\t'),
        "pipe" => Some(b'|'),
        other if other.len() == 1 && other.is_ascii() => Some(other.as_bytes()[0]),
        _ => None,
    }
}

/// Uppercase `code` and append `suffix` unless it is already there.
pub fn normalize_code(code: &str, suffix: &str) -> Option<Symbol> {
    let code = code.trim().to_uppercase();
    if code.is_empty() {
        return None;
    }
    let suffix = suffix.to_uppercase();
    if !suffix.is_empty() && code.ends_with(&suffix) {
        Some(Symbol::new(code))
    } else {
        Some(Symbol::new(format!("{code}{suffix}")))
    }
}

/// Normalize raw codes, dropping blanks and duplicates. First occurrence wins.
pub fn normalize_codes<I, S>(codes: I, suffix: &str) -> Vec<Symbol>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut symbols = Vec::new();
    for code in codes {
        if let Some(symbol) = normalize_code(code.as_ref(), suffix) {
            if seen.insert(symbol.clone()) {
                symbols.push(symbol);
            }
        }
    }
    symbols
}

/// Parse a comma-separated selection such as `petr4, VALE3.SA`.
pub fn parse_symbol_list(input: &str, suffix: &str) -> Result<Vec<Symbol>, UniverseError> {
    let mut tokens = Vec::new();
    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        tokens.push(trimmed);
    }
    Ok(normalize_codes(tokens, suffix))
}
