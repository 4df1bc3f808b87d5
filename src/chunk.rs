//! Paragraph-boundary text chunker.
//!
//! Splits a content body into [`Chunk`]s that respect the configured
//! `chunk_size` character limit. Splitting happens on blank-line paragraph
//! boundaries first to keep chunks semantically coherent; a paragraph that
//! is itself oversized is re-split on sentence boundaries. A single
//! sentence longer than the limit stands alone rather than being cut.

use crate::models::Chunk;

/// Split `text` into ordered chunks of at most `chunk_size` characters.
///
/// Empty or whitespace-only input yields no chunks; callers treat that
/// as "nothing to index", not an error. Input that already fits returns
/// exactly one chunk equal to the trimmed text. When more than one chunk
/// results, `title` (if any) is prepended to the first chunk as a heading
/// line followed by a blank line.
///
/// Indices are 0-based and contiguous; `total` is identical across all
/// chunks of one call; concatenating the chunk texts loses nothing.
pub fn chunk_text(text: &str, title: Option<&str>, chunk_size: usize) -> Vec<Chunk> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if text.len() <= chunk_size {
        return vec![Chunk {
            text: text.to_string(),
            index: 0,
            total: 1,
        }];
    }

    let pieces = split_by_paragraphs(text, chunk_size);
    let total = pieces.len();

    pieces
        .into_iter()
        .enumerate()
        .map(|(index, piece)| {
            let text = match title {
                Some(t) if index == 0 && total > 1 && !t.is_empty() => {
                    format!("{}\n\n{}", t, piece)
                }
                _ => piece,
            };
            Chunk { text, index, total }
        })
        .collect()
}

/// Greedily pack paragraphs into chunks of at most `chunk_size` chars.
///
/// Consecutive paragraphs accumulate into a buffer (rejoined with the
/// `\n\n` separator they were split on) until the next one would overflow
/// it. An oversized paragraph flushes the buffer and is packed sentence
/// by sentence instead, rejoined with single spaces.
fn split_by_paragraphs(content: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for para in content.split("\n\n") {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }

        if para.len() > chunk_size {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            for sentence in split_sentences(para) {
                if current.len() + sentence.len() <= chunk_size {
                    if !current.is_empty() {
                        current.push(' ');
                    }
                    current.push_str(sentence);
                } else {
                    if !current.is_empty() {
                        chunks.push(std::mem::take(&mut current));
                    }
                    current.push_str(sentence);
                }
            }
        } else if current.len() + para.len() + 2 <= chunk_size {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(para);
        } else {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current.push_str(para);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Split on sentence boundaries: `.`, `!`, or `?` followed by whitespace.
/// The punctuation stays with its sentence; the whitespace is consumed.
fn split_sentences(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if matches!(b, b'.' | b'!' | b'?')
            && bytes.get(i + 1).is_some_and(|c| c.is_ascii_whitespace())
        {
            sentences.push(&text[start..=i]);
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            start = i;
        } else {
            i += 1;
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_text("  Hello, world!  ", None, 500);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello, world!");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].total, 1);
    }

    #[test]
    fn test_empty_input_no_chunks() {
        assert!(chunk_text("", None, 500).is_empty());
        assert!(chunk_text("   \n\n  ", None, 500).is_empty());
    }

    #[test]
    fn test_single_chunk_never_carries_title() {
        let chunks = chunk_text("Short body.", Some("My Title"), 500);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Short body.");
    }

    #[test]
    fn test_paragraphs_accumulate_until_full() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunk_text(text, None, 40);
        assert!(chunks.len() > 1);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i);
            assert_eq!(c.total, chunks.len());
            assert!(c.text.len() <= 40, "chunk {} over budget: {:?}", i, c.text);
        }
    }

    #[test]
    fn test_title_prepended_to_first_chunk_only() {
        let text = "First paragraph with some content.\n\nSecond paragraph with more content here.";
        let chunks = chunk_text(text, Some("Porosity Guide"), 40);
        assert!(chunks.len() > 1);
        assert!(chunks[0].text.starts_with("Porosity Guide\n\n"));
        for c in &chunks[1..] {
            assert!(!c.text.contains("Porosity Guide"));
        }
    }

    #[test]
    fn test_oversized_paragraph_splits_on_sentences() {
        let text = "Intro para.\n\nOne long sentence here. Another long sentence there. And a third one follows. Plus a fourth for good measure.";
        let chunks = chunk_text(text, None, 50);
        assert!(chunks.len() > 1);
        // Sentence fragments keep their terminal punctuation.
        for c in &chunks {
            assert!(c.text.ends_with('.'), "unexpected chunk end: {:?}", c.text);
        }
    }

    #[test]
    fn test_single_long_sentence_stands_alone() {
        let long = "word ".repeat(30).trim_end().to_string() + ".";
        let text = format!("Short lead-in.\n\n{}", long);
        let chunks = chunk_text(&text, None, 60);
        assert!(chunks.iter().any(|c| c.text == long));
    }

    #[test]
    fn test_no_text_dropped() {
        let paragraphs: Vec<String> = (0..12)
            .map(|i| format!("Paragraph number {} with a little body text.", i))
            .collect();
        let text = paragraphs.join("\n\n");
        let chunks = chunk_text(&text, None, 100);

        let rejoined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn test_deterministic() {
        let text = "Alpha alpha alpha.\n\nBeta beta beta.\n\nGamma gamma gamma.";
        let a = chunk_text(text, Some("T"), 25);
        let b = chunk_text(text, Some("T"), 25);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sentence_splitter_boundaries() {
        let sentences = split_sentences("One. Two!  Three? Four");
        assert_eq!(sentences, vec!["One.", "Two!", "Three?", "Four"]);
    }

    #[test]
    fn test_sentence_splitter_keeps_inline_punctuation() {
        // No whitespace after the dot means no boundary.
        let sentences = split_sentences("v1.2 is out. Upgrade now");
        assert_eq!(sentences, vec!["v1.2 is out.", "Upgrade now"]);
    }
}
