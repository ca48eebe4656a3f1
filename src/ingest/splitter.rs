//! Fixed-size overlapping chunking.

/// Characters per chunk.
pub const CHUNK_SIZE: usize = 1000;

/// Characters shared between consecutive chunks.
pub const CHUNK_OVERLAP: usize = 150;

/// Splits `text` into overlapping windows of at most `chunk_size`
/// characters, each starting `chunk_size - overlap` characters after the
/// previous one.
///
/// Windows are trimmed and empty ones dropped, so whitespace-heavy pages
/// do not produce useless chunks. Order follows the text. An `overlap`
/// at or above `chunk_size` degrades to non-overlapping windows rather
/// than looping forever.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if chunk_size == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let trimmed = window.trim();
        if !trimmed.is_empty() {
            chunks.push(trimmed.to_string());
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
