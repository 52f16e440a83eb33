//! Raw read normalisation

use contracts::ContentKind;

/// Clean one read before it is accumulated or framed.
///
/// Strips a single trailing NUL byte, then ASCII whitespace on both sides.
/// For the `text` kind a trailing newline is kept so line framing can still
/// complete, including when the terminator arrives in a read of its own.
pub fn normalize_chunk<'a>(chunk: &'a [u8], kind: &ContentKind) -> &'a [u8] {
    let chunk = chunk.strip_suffix(b"\0").unwrap_or(chunk);
    let trimmed = chunk.trim_ascii();

    if *kind == ContentKind::Text && trimmed.is_empty() {
        return match chunk.iter().position(|&b| b == b'\n') {
            Some(newline) => &chunk[newline..=newline],
            None => trimmed,
        };
    }

    if *kind == ContentKind::Text {
        let end = chunk.len() - chunk.trim_ascii_start().len() + trimmed.len();
        if let Some(newline) = chunk[end..].iter().position(|&b| b == b'\n') {
            let start = chunk.len() - chunk.trim_ascii_start().len();
            return &chunk[start..end + newline + 1];
        }
    }

    trimmed
}
