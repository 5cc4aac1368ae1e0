//! Custom cipher used by the kwik player page: segments of the scrambled
//! payload are substitution-encoded positional numbers, one per character
//! of the original script text.

use std::collections::HashMap;

use crate::error::ExtractError;

const CHARACTER_MAP: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+/";

/// Parameters of one scrambled payload, lifted off the player page script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherParams {
    pub full_string: String,
    pub key: String,
    pub offset: u64,
    pub base: u64,
}

impl CipherParams {
    pub fn decrypt(&self) -> Result<String, ExtractError> {
        decrypt(&self.full_string, &self.key, self.offset, self.base)
    }
}

/// Positional value of a digit string in `base`. Characters that are not
/// ASCII digits count as 0. `None` when the value does not fit in a
/// `u64`; segment lengths come off the remote page, so this is reachable.
pub fn decimal_of(content: &str, base: u64) -> Option<u64> {
    content.chars().try_fold(0u64, |acc, ch| {
        acc.checked_mul(base)?
            .checked_add(u64::from(ch.to_digit(10).unwrap_or(0)))
    })
}

/// Re-encodes `value` with the first `base` characters of the character
/// map, most significant first. Zero encodes as `"0"`.
pub fn encode(mut value: u64, base: u64) -> String {
    let alphabet: Vec<char> = CHARACTER_MAP.chars().take(base as usize).collect();

    let mut out = String::new();
    while value > 0 {
        out.insert(0, alphabet[(value % base) as usize]);
        value /= base;
    }

    if out.is_empty() { "0".into() } else { out }
}

/// Recovers the plain script text from the scrambled payload.
///
/// Segments of `full_string` are terminated by `key[base]`. Within a
/// segment every character is an index into `key`, and the mapped digit
/// string, read in `base`, is the code point of one output character
/// shifted by `offset`. The digit table is built once up front so that a
/// two-digit index can never clobber digits produced by an earlier
/// substitution.
pub fn decrypt(full_string: &str, key: &str, offset: u64, base: u64) -> Result<String, ExtractError> {
    let key_chars: Vec<char> = key.chars().collect();
    let terminator = *key_chars
        .get(base as usize)
        .ok_or(ExtractError::Parse("cipher key shorter than its base"))?;

    let digit_of: HashMap<char, String> = key_chars
        .iter()
        .enumerate()
        .map(|(idx, &ch)| (ch, idx.to_string()))
        .collect();

    let mut out = String::new();
    let mut segment = String::new();

    for ch in full_string.chars() {
        if ch != terminator {
            match digit_of.get(&ch) {
                Some(digits) => segment.push_str(digits),
                None => segment.push(ch),
            }
            continue;
        }

        let code = decimal_of(&segment, base)
            .ok_or(ExtractError::Parse("cipher segment out of range"))?
            .checked_sub(offset)
            .and_then(|value| u32::try_from(value).ok())
            .and_then(char::from_u32)
            .ok_or(ExtractError::Parse("cipher produced an invalid code point"))?;
        out.push(code);
        segment.clear();
    }

    if !segment.is_empty() {
        // upstream page format changed
        return Err(ExtractError::Parse("unterminated cipher segment"));
    }

    Ok(out)
}


#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "GXLoidgUKN7";

    #[test]
    fn should_round_trip_base_conversion() {
        for base in 2..=10 {
            for value in [0u64, 1, 9, 255, 4096, 31337] {
                assert_eq!(decimal_of(&encode(value, base), base), Some(value), "base {base}");
            }
        }
    }

    #[test]
    fn should_treat_non_digits_as_zero() {
        assert_eq!(decimal_of("a1", 10), Some(1));
        assert_eq!(decimal_of("1a", 10), Some(10));
        assert_eq!(decimal_of("", 10), Some(0));
    }

    #[test]
    fn should_reject_oversized_value() {
        assert_eq!(decimal_of(&"9".repeat(40), 10), None);
    }

    #[test]
    fn should_encode_zero() {
        assert_eq!(encode(0, 8), "0");
    }

    #[test]
    fn should_decrypt_encoded_fixture() {
        let plain = r#"<form action="https://kwik.cx/d/Ab12" method="POST"><input value="tok">"#;
        let scrambled = testing::encrypt(plain, KEY, 7, 10);

        assert_eq!(decrypt(&scrambled, KEY, 7, 10).unwrap(), plain);
    }

    #[test]
    fn should_decrypt_in_smaller_base() {
        let plain = "episode 12";
        let scrambled = testing::encrypt(plain, KEY, 48, 8);

        assert_eq!(decrypt(&scrambled, KEY, 48, 8).unwrap(), plain);
    }

    #[test]
    fn should_fail_on_oversized_segment() {
        // 'N' maps to digit 9 in KEY, '7' is the base-10 terminator
        let scrambled = format!("{}7", "N".repeat(40));
        let err = decrypt(&scrambled, KEY, 7, 10).unwrap_err();
        assert!(matches!(err, ExtractError::Parse("cipher segment out of range")));
    }

    #[test]
    fn should_fail_without_terminator() {
        let err = decrypt("GXL", KEY, 7, 10).unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }

    #[test]
    fn should_fail_on_short_key() {
        let err = decrypt("GXL", "GX", 7, 10).unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }
}
