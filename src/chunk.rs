//! Paragraph-boundary text chunker.
//!
//! Splits article content into pieces of at most `max_chars` bytes so that
//! a single long wiki page or lore entry cannot crowd every other source
//! out of the prompt. Splitting occurs on paragraph boundaries (blank
//! lines) first; paragraphs longer than the limit are hard-split at the
//! nearest newline or space, never inside a UTF-8 character.

/// Split text into chunks on paragraph boundaries, respecting `max_chars`.
///
/// Empty and whitespace-only input yields no chunks.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let normalized = text.replace("\r\n", "\n");
    let mut chunks = Vec::new();
    let mut current_buf = String::new();

    for para in normalized.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        // If adding this paragraph would exceed max, flush current buffer
        let would_be = if current_buf.is_empty() {
            trimmed.len()
        } else {
            current_buf.len() + 2 + trimmed.len()
        };

        if would_be > max_chars && !current_buf.is_empty() {
            chunks.push(std::mem::take(&mut current_buf));
        }

        if trimmed.len() > max_chars {
            hard_split(trimmed, max_chars, &mut chunks);
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str("\n\n");
            }
            current_buf.push_str(trimmed);
        }
    }

    if !current_buf.is_empty() {
        chunks.push(current_buf);
    }

    chunks
}

fn hard_split(paragraph: &str, max_chars: usize, chunks: &mut Vec<String>) {
    let mut remaining = paragraph;
    while !remaining.is_empty() {
        let split_at = floor_char_boundary(remaining, max_chars);
        let actual_split = if split_at < remaining.len() {
            remaining[..split_at]
                .rfind('\n')
                .or_else(|| remaining[..split_at].rfind(' '))
                .map(|pos| pos + 1)
                .unwrap_or(split_at)
        } else {
            split_at
        };
        // A multibyte char wider than max_chars still has to make progress.
        let actual_split = if actual_split == 0 {
            remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len())
        } else {
            actual_split
        };
        let piece = remaining[..actual_split].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        remaining = &remaining[actual_split..];
    }
}

/// Largest index `<= max` that lies on a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("Hola, mundo!", 1000);
        assert_eq!(chunks, vec!["Hola, mundo!".to_string()]);
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 1000).is_empty());
        assert!(chunk_text("\n\n   \n\n", 1000).is_empty());
    }

    #[test]
    fn test_multiple_paragraphs_under_limit() {
        let text = "Primer parrafo.\n\nSegundo parrafo.\r\n\r\nTercer parrafo.";
        let chunks = chunk_text(text, 1000);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("Primer parrafo."));
        assert!(chunks[0].contains("Tercer parrafo."));
    }

    #[test]
    fn test_multiple_paragraphs_exceed_limit() {
        let text = "Este es el parrafo uno.\n\nEste es el parrafo dos.\n\nEste es el tres.";
        let chunks = chunk_text(text, 30);
        assert_eq!(chunks.len(), 3);
        for c in &chunks {
            assert!(c.len() <= 30, "chunk too long: {:?}", c);
        }
    }

    #[test]
    fn test_oversized_paragraph_hard_split_on_spaces() {
        let para = (0..100).map(|i| format!("palabra{}", i)).collect::<Vec<_>>().join(" ");
        let chunks = chunk_text(&para, 50);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.len() <= 50);
            assert!(!c.starts_with(' ') && !c.ends_with(' '));
        }
        assert_eq!(chunks.join(" "), para);
    }

    #[test]
    fn test_hard_split_respects_utf8() {
        let para = "ñ".repeat(40);
        let chunks = chunk_text(&para, 7);
        assert!(chunks.iter().all(|c| c.len() <= 7));
        assert_eq!(chunks.concat(), para);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alfa\n\nBeta\n\nGamma\n\nDelta";
        assert_eq!(chunk_text(text, 8), chunk_text(text, 8));
    }
}
