//! Random password generator

use rand::{rngs::OsRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const NUMBERS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()_+~`|}{[]:;?><,./-=";

/// Returned instead of a password when every category is disabled
pub const NO_CHARACTERS_SELECTED: &str = "(No character types selected)";

/// Default generated password length
pub const DEFAULT_LENGTH: usize = 16;

/// Character categories to draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PasswordOptions {
    pub include_uppercase: bool,
    pub include_lowercase: bool,
    pub include_numbers: bool,
    pub include_symbols: bool,
}

impl Default for PasswordOptions {
    fn default() -> Self {
        Self {
            include_uppercase: true,
            include_lowercase: true,
            include_numbers: true,
            include_symbols: true,
        }
    }
}

impl PasswordOptions {
    fn categories(&self) -> Vec<&'static [u8]> {
        [
            (self.include_uppercase, UPPERCASE),
            (self.include_lowercase, LOWERCASE),
            (self.include_numbers, NUMBERS),
            (self.include_symbols, SYMBOLS),
        ]
        .into_iter()
        .filter_map(|(enabled, set)| enabled.then_some(set))
        .collect()
    }
}

/// Generate a random password of exactly `length` characters
///
/// Every enabled category contributes at least one character when `length`
/// leaves room for it; the rest is drawn uniformly from the union of enabled
/// categories and the result is Fisher-Yates shuffled. With no category
/// enabled, [`NO_CHARACTERS_SELECTED`] is returned.
pub fn generate_strong_password(length: usize, options: PasswordOptions) -> String {
    let categories = options.categories();
    if categories.is_empty() {
        return NO_CHARACTERS_SELECTED.to_string();
    }

    let mut rng = OsRng;

    // One guaranteed pick per category, shuffled so that a short length
    // drops a random category rather than always the last one.
    let mut required: Vec<u8> = categories
        .iter()
        .filter_map(|set| set.choose(&mut rng).copied())
        .collect();
    required.shuffle(&mut rng);
    required.truncate(length);

    let pool: Vec<u8> = categories.concat();
    let mut password = required;
    while password.len() < length {
        if let Some(&c) = pool.choose(&mut rng) {
            password.push(c);
        }
    }

    password.shuffle(&mut rng);
    password.into_iter().map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(upper: bool, lower: bool, numbers: bool, symbols: bool) -> PasswordOptions {
        PasswordOptions {
            include_uppercase: upper,
            include_lowercase: lower,
            include_numbers: numbers,
            include_symbols: symbols,
        }
    }

    #[test]
    fn test_uppercase_only() {
        let password = generate_strong_password(8, only(true, false, false, false));

        assert_eq!(password.len(), 8);
        assert!(password.chars().all(|c| c.is_ascii_uppercase()));
    }

    #[test]
    fn test_all_categories_present() {
        for _ in 0..50 {
            let password = generate_strong_password(4, PasswordOptions::default());

            assert_eq!(password.len(), 4);
            assert!(password.bytes().any(|c| UPPERCASE.contains(&c)));
            assert!(password.bytes().any(|c| LOWERCASE.contains(&c)));
            assert!(password.bytes().any(|c| NUMBERS.contains(&c)));
            assert!(password.bytes().any(|c| SYMBOLS.contains(&c)));
        }
    }

    #[test]
    fn test_no_categories_returns_sentinel() {
        let password = generate_strong_password(16, only(false, false, false, false));
        assert_eq!(password, NO_CHARACTERS_SELECTED);
    }

    #[test]
    fn test_short_length_is_respected() {
        let password = generate_strong_password(2, PasswordOptions::default());
        assert_eq!(password.len(), 2);

        assert!(generate_strong_password(0, PasswordOptions::default()).is_empty());
    }

    #[test]
    fn test_numbers_and_symbols_only() {
        let password = generate_strong_password(32, only(false, false, true, true));

        assert_eq!(password.len(), 32);
        assert!(password
            .bytes()
            .all(|c| NUMBERS.contains(&c) || SYMBOLS.contains(&c)));
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let options: PasswordOptions = serde_json::from_str(
            r#"{"includeUppercase":true,"includeLowercase":false,"includeNumbers":true,"includeSymbols":false}"#,
        )
        .unwrap();
        assert_eq!(options, only(true, false, true, false));
    }
}
