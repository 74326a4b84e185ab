//! Outbound chunking.
//!
//! Chat transports cap message length, so long replies are split into
//! chunks of at most `limit` characters. Splits fall after sentence
//! terminators where possible. A chunk that ends inside a fenced code block
//! gets a closing fence, and the next chunk reopens it, so every chunk
//! renders on its own.

const FENCE: &str = "```";
const CLOSE_FENCE: &str = "\n```";
const REOPEN_FENCE: &str = "```\n";
const SENTENCE_ENDS: [char; 6] = ['。', '！', '？', '!', '?', '.'];

/// Smallest limit that leaves room for content besides the fences.
pub const MIN_CHUNK_LIMIT: usize = 16;

/// Split `text` into chunks of at most `limit` characters, each holding an
/// even number of code fences.
pub fn split_reply(text: &str, limit: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let limit = limit.max(MIN_CHUNK_LIMIT);
    if char_len(text) <= limit && fence_count(text) % 2 == 0 {
        return vec![text.to_string()];
    }

    // Room for a reopening fence at the start and a closing one at the end.
    let budget = limit - REOPEN_FENCE.len() - CLOSE_FENCE.len();

    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for sentence in sentences(text) {
        for piece in hard_split(sentence, budget) {
            let piece_len = char_len(piece);
            if current_len + piece_len > budget && !current.is_empty() {
                segments.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push_str(piece);
            current_len += piece_len;
        }
    }
    if !current.is_empty() {
        segments.push(current);
    }

    let mut chunks = Vec::with_capacity(segments.len());
    let mut fence_open = false;
    for segment in &segments {
        let body = segment.trim();
        if body.is_empty() {
            continue;
        }
        let mut chunk = String::with_capacity(body.len() + REOPEN_FENCE.len() + CLOSE_FENCE.len());
        if fence_open {
            chunk.push_str(REOPEN_FENCE);
        }
        chunk.push_str(body);
        fence_open = fence_count(&chunk) % 2 == 1;
        if fence_open {
            chunk.push_str(CLOSE_FENCE);
        }
        chunks.push(chunk);
    }
    chunks
}

/// Number of code fence markers in `text`.
pub fn fence_count(text: &str) -> usize {
    text.matches(FENCE).count()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split after every sentence terminator, keeping the terminator.
fn sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if SENTENCE_ENDS.contains(&c) {
            let end = i + c.len_utf8();
            out.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

/// Cut `text` into pieces of at most `max` characters.
fn hard_split(text: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while char_len(rest) > max {
        let cut = split_point(rest, max);
        pieces.push(&rest[..cut]);
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

/// Byte offset to cut at: after the last whitespace within `max`
/// characters, and never between two backticks.
fn split_point(text: &str, max: usize) -> usize {
    let hard = text
        .char_indices()
        .nth(max)
        .map_or(text.len(), |(i, _)| i);

    let window = &text[..hard];
    let mut cut = match window.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
        Some((i, c)) if i > 0 => i + c.len_utf8(),
        _ => hard,
    };

    if text[..cut].ends_with('`') && text[cut..].starts_with('`') {
        cut = text[..cut].trim_end_matches('`').len();
    }
    if cut == 0 { hard } else { cut }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(chunks: &[String], limit: usize) {
        for chunk in chunks {
            assert!(
                char_len(chunk) <= limit,
                "chunk of {} chars exceeds {limit}",
                char_len(chunk)
            );
            assert_eq!(fence_count(chunk) % 2, 0, "unbalanced fences in {chunk:?}");
        }
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks = split_reply("A list is ordered. A set is not.", 1800);
        assert_eq!(chunks, vec!["A list is ordered. A set is not.".to_string()]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(split_reply("", 1800).is_empty());
        assert!(split_reply("  \n", 1800).is_empty());
    }

    #[test]
    fn test_splits_on_sentence_boundaries() {
        let sentence = "This sentence is exactly forty chars ok. ";
        let text = sentence.repeat(100);
        let chunks = split_reply(&text, 400);
        assert!(chunks.len() >= 10);
        assert_well_formed(&chunks, 400);
        for chunk in &chunks {
            assert!(chunk.ends_with('.'), "chunk should end at a sentence: {chunk:?}");
        }
        let rejoined: String = chunks.join(" ");
        assert_eq!(rejoined.matches("forty chars").count(), 100);
    }

    #[test]
    fn test_unterminated_fence_4000_chars() {
        let mut text = String::from("Here is how a loop works. ");
        text.push_str("```python\n");
        while char_len(&text) < 4000 {
            text.push_str("for i in range(10): print(i) # loop body. ");
        }
        let text: String = text.chars().take(4000).collect();
        assert_eq!(fence_count(&text), 1);

        let chunks = split_reply(&text, 1800);
        assert!(chunks.len() >= 3, "got {} chunks", chunks.len());
        assert_well_formed(&chunks, 1800);
        // Continuation chunks reopen the block.
        assert!(chunks[1].starts_with("```\n"));
    }

    #[test]
    fn test_closed_block_not_reopened() {
        let prose = "Some explanation follows here. ".repeat(30);
        let text = format!("```python\nprint('hi')\n```\n{prose}");
        let chunks = split_reply(&text, 200);
        assert_well_formed(&chunks, 200);
        assert!(chunks.iter().skip(1).all(|c| !c.starts_with("```")));
    }

    #[test]
    fn test_long_unbroken_text_hard_splits() {
        let text = "x".repeat(5000);
        let chunks = split_reply(&text, 1800);
        assert_eq!(chunks.len(), 3);
        assert_well_formed(&chunks, 1800);
        assert_eq!(chunks.iter().map(|c| char_len(c)).sum::<usize>(), 5000);
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let text = "變數是用來儲存資料的名稱。".repeat(400);
        let chunks = split_reply(&text, 1800);
        assert!(chunks.len() >= 3);
        assert_well_formed(&chunks, 1800);
    }

    #[test]
    fn test_split_point_avoids_backtick_runs() {
        let text = "abcdefg```hij";
        // A hard cut at 8 would land between backticks.
        let cut = split_point(text, 8);
        assert_eq!(&text[..cut], "abcdefg");
    }

    #[test]
    fn test_split_point_prefers_whitespace() {
        let text = "alpha beta gamma";
        let cut = split_point(text, 12);
        assert_eq!(&text[..cut], "alpha beta ");
    }

    #[test]
    fn test_short_text_with_open_fence_is_closed() {
        let chunks = split_reply("```python\nprint(1)", 1800);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], "```python\nprint(1)\n```");
    }
}
