//! Fixed-size overlapping text chunker.
//!
//! Slices text into windows of `chunk_size` characters, starting a new window
//! every `chunk_size - overlap` characters, until the start offset reaches
//! the end of the text. The last window may be shorter than `chunk_size`.
//!
//! Lengths are counted in Unicode scalar values, so a window never splits a
//! multi-byte character.

/// Split `text` into overlapping slices borrowed from the input.
///
/// Returns an empty vector for empty text. Callers must ensure
/// `overlap < chunk_size`; the configuration loader enforces this.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<&str> {
    debug_assert!(chunk_size > 0 && overlap < chunk_size);
    let step = chunk_size.saturating_sub(overlap).max(1);

    // Byte offset of every char boundary, plus the end of the string.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    let mut chunks = Vec::with_capacity(char_count.div_ceil(step));
    let mut start = 0;
    while start < char_count {
        let end = (start + chunk_size).min(char_count);
        chunks.push(&text[boundaries[start]..boundaries[end]]);
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Undo the overlap: every chunk but the last contributes its first
    /// `step` characters, the last contributes everything.
    fn reconstruct(chunks: &[&str], step: usize) -> String {
        let mut out = String::new();
        for (i, c) in chunks.iter().enumerate() {
            if i + 1 == chunks.len() {
                out.push_str(c);
            } else {
                out.extend(c.chars().take(step));
            }
        }
        out
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 1200, 150).is_empty());
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("Hello, world!", 1200, 150);
        assert_eq!(chunks, vec!["Hello, world!"]);
    }

    #[test]
    fn test_windows_overlap() {
        let chunks = chunk_text("abcdefghij", 4, 1);
        assert_eq!(chunks, vec!["abcd", "defg", "ghij", "j"]);
    }

    #[test]
    fn test_chunk_count_matches_ceiling() {
        let text = "x".repeat(2500);
        for (size, overlap) in [(1200, 150), (100, 0), (7, 3), (10, 9)] {
            let chunks = chunk_text(&text, size, overlap);
            let step = size - overlap;
            assert_eq!(
                chunks.len(),
                text.len().div_ceil(step),
                "size={} overlap={}",
                size,
                overlap
            );
        }
    }

    #[test]
    fn test_full_windows_have_chunk_size() {
        let text: String = (0..997).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let (size, overlap) = (120, 15);
        let chunks = chunk_text(&text, size, overlap);
        let step = size - overlap;
        for (i, c) in chunks.iter().enumerate() {
            if i * step + size <= text.len() {
                assert_eq!(c.len(), size, "chunk {} should be full", i);
            }
        }
        assert!(chunks.last().unwrap().len() <= size);
    }

    #[test]
    fn test_reconstructs_original() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(40);
        let (size, overlap) = (64, 16);
        let chunks = chunk_text(&text, size, overlap);
        assert_eq!(reconstruct(&chunks, size - overlap), text);
    }

    #[test]
    fn test_multibyte_characters() {
        let text = "àèìòù·çñ€😀".repeat(5);
        let chunks = chunk_text(&text, 6, 2);
        for c in &chunks[..chunks.len() - 1] {
            assert_eq!(c.chars().count(), 6);
        }
        assert_eq!(reconstruct(&chunks, 4), text);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha beta gamma delta epsilon zeta eta theta";
        assert_eq!(chunk_text(text, 10, 3), chunk_text(text, 10, 3));
    }
}
