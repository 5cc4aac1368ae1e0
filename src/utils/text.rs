/// Derives the quality tier label from a listing key like `"720"` or
/// `"kwik · 1080p"`: the trailing run of digits, or the key itself when it
/// does not end in a pixel count.
pub fn quality_label(key: &str) -> String {
    let trimmed = key.trim().trim_end_matches(['p', 'P']);

    let mut digits: Vec<char> = trimmed
        .chars()
        .rev()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();
    digits.reverse();

    if digits.is_empty() {
        key.to_owned()
    } else {
        digits.into_iter().collect()
    }
}
