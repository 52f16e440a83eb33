//! Completion detector

use contracts::ContentKind;

/// Decide whether `buffer` holds one complete message of the given kind.
///
/// - `json`: the last byte is `}`. This is a trailing-brace heuristic, not a
///   structural parse: nesting is not checked, and a document cut right after
///   a `}` inside a string literal is reported complete.
/// - `text`: the last byte is `\n`.
/// - anything else: always complete, including empty input.
pub fn is_complete(buffer: &[u8], kind: &ContentKind) -> bool {
    match kind {
        ContentKind::Json => buffer.last() == Some(&b'}'),
        ContentKind::Text => buffer.last() == Some(&b'\n'),
        ContentKind::Opaque(_) => true,
    }
}
