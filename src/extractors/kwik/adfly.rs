//! Decoder for the `ysmm` payload planted by the ad gate: two interleaved
//! half-strings hiding a digit-XOR-corrupted base64 blob, framed by 16
//! filler characters on each side.

use base64::{Engine, prelude::BASE64_STANDARD};

use crate::error::ExtractError;

const FRAME_LEN: usize = 16;

/// Recovers the target URL hidden in an ad-gate token. Returns the empty
/// string when the decoded payload carries nothing but its framing.
pub fn descramble(token: &str) -> Result<String, ExtractError> {
    let mut even_part = String::new();
    let mut odd_part = String::new();
    for (idx, ch) in token.chars().enumerate() {
        if idx % 2 == 0 {
            even_part.push(ch);
        } else {
            odd_part.insert(0, ch);
        }
    }

    let mut chars: Vec<char> = even_part.chars().chain(odd_part.chars()).collect();

    let digits: Vec<(usize, u32)> = chars
        .iter()
        .enumerate()
        .filter_map(|(idx, ch)| ch.to_digit(10).map(|digit| (idx, digit)))
        .collect();

    // chunks_exact drops an odd trailing digit
    for pair in digits.chunks_exact(2) {
        let (idx, first) = pair[0];
        let (_, second) = pair[1];

        let xor = first ^ second;
        if let Some(digit) = char::from_digit(xor, 10) {
            chars[idx] = digit;
        }
    }

    let joined: String = chars.into_iter().collect();
    let decoded = BASE64_STANDARD
        .decode(joined.as_bytes())
        .map_err(|_| ExtractError::Parse("ad-gate token is not valid base64"))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| ExtractError::Parse("ad-gate token is not valid utf-8"))?;

    let total = decoded.chars().count();
    if total <= 2 * FRAME_LEN {
        return Ok(String::new());
    }

    Ok(decoded
        .chars()
        .skip(FRAME_LEN)
        .take(total - 2 * FRAME_LEN)
        .collect())
}

#[cfg(test)]
pub mod testing {
    use base64::{Engine, prelude::BASE64_STANDARD};

    use super::FRAME_LEN;

    /// Builds a token that [`descramble`](super::descramble) resolves back
    /// to `payload`, digit-pair corruption included.
    pub fn build_token(payload: &str) -> String {
        let framed = format!(
            "{frame}{payload}{frame}",
            frame = "x".repeat(FRAME_LEN)
        );
        scramble(&xor_digit_pairs(&BASE64_STANDARD.encode(framed)))
    }

    /// XORs the first member of every digit pair with the second; an
    /// involution, so applying it twice restores the input.
    fn xor_digit_pairs(text: &str) -> String {
        let mut chars: Vec<char> = text.chars().collect();

        let digits: Vec<(usize, u32)> = chars
            .iter()
            .enumerate()
            .filter_map(|(idx, ch)| ch.to_digit(10).map(|digit| (idx, digit)))
            .collect();

        for pair in digits.chunks_exact(2) {
            let (idx, first) = pair[0];
            let (_, second) = pair[1];

            let xor = first ^ second;
            if let Some(digit) = char::from_digit(xor, 10) {
                chars[idx] = digit;
            }
        }

        chars.into_iter().collect()
    }

    /// Inverse of the de-interleave step: even token positions replay the
    /// first half in order, odd positions the second half reversed.
    fn scramble(text: &str) -> String {
        let chars: Vec<char> = text.chars().collect();
        let half = chars.len().div_ceil(2);
        let (even, odd) = chars.split_at(half);

        let mut token = Vec::with_capacity(chars.len());
        let mut rev_odd = odd.iter().rev();
        for &ch in even {
            token.push(ch);
            if let Some(&next) = rev_odd.next() {
                token.push(next);
            }
        }
        token.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_descramble_token() {
        let payload = "https://kwik.cx/f/r2fc71LPvMFD";
        let token = testing::build_token(payload);

        assert_eq!(descramble(&token).unwrap(), payload);
    }

    #[test]
    fn should_descramble_digit_heavy_token() {
        // plenty of digit pairs in the base64 form, including ones whose
        // XOR is >= 10 and must stay untouched
        let payload = "https://kwik.cx/f/0912345678aZ9";
        let token = testing::build_token(payload);

        assert_eq!(descramble(&token).unwrap(), payload);
    }

    #[test]
    fn should_yield_empty_string_for_framing_only() {
        let token = testing::build_token("");
        assert_eq!(descramble(&token).unwrap(), "");
    }

    #[test]
    fn should_reject_garbage() {
        let err = descramble("!!!not base64!!!").unwrap_err();
        assert!(matches!(err, ExtractError::Parse(_)));
    }
}
