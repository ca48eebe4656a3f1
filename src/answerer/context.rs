//! Deterministic assembly of retrieval hits into a bounded context string.

use super::types::ScoredChunk;

/// Separator emitted between consecutive chunks. It is charged against the
/// character budget like any chunk text.
pub const CHUNK_SEPARATOR: &str = "\n\n---\n\n";

/// Concatenates `hits` (best first) into a single context string of at
/// most `max_chars` characters.
///
/// Each hit is rendered as a provenance header (`[page=<p> score=<s>]` when
/// the page is known, `[score=<s>]` otherwise) followed by its trimmed
/// text. Hits whose text trims to nothing are skipped entirely, so no
/// header-only entries appear. The running total counts separators; a hit
/// is only emitted while the remaining budget is positive, and the last
/// emitted hit is hard-cut at the character that exactly fills the budget.
///
/// The budget is measured in characters, not bytes, so a cut never splits
/// a multi-byte scalar value.
pub fn assemble_context(hits: &[ScoredChunk], max_chars: usize) -> String {
    let separator_chars = CHUNK_SEPARATOR.chars().count();

    let mut out = String::new();
    let mut total = 0usize;

    for hit in hits {
        let body = hit.content.trim();
        if body.is_empty() {
            continue;
        }

        let header = match hit.page {
            Some(page) => format!("[page={page} score={}]\n", hit.score),
            None => format!("[score={}]\n", hit.score),
        };
        let chunk = format!("{header}{body}");

        let separator = if out.is_empty() { 0 } else { separator_chars };
        let budget = max_chars as i64 - total as i64 - separator as i64;
        if budget <= 0 {
            break;
        }
        let budget = budget as usize;

        let chunk_chars = chunk.chars().count();
        if separator > 0 {
            out.push_str(CHUNK_SEPARATOR);
        }
        if chunk_chars > budget {
            out.extend(chunk.chars().take(budget));
            total += separator + budget;
        } else {
            out.push_str(&chunk);
            total += separator + chunk_chars;
        }

        if total >= max_chars {
            break;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, score: f64, page: Option<i64>) -> ScoredChunk {
        ScoredChunk {
            content: content.to_string(),
            score,
            page,
            source: None,
        }
    }

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn empty_hits_produce_empty_context() {
        assert_eq!(assemble_context(&[], 0), "");
        assert_eq!(assemble_context(&[], 12_000), "");
    }

    #[test]
    fn whitespace_only_chunks_are_skipped() {
        let hits = vec![chunk("   \n\t ", 0.1, Some(1)), chunk("", 0.2, None)];
        assert_eq!(assemble_context(&hits, 100), "");
    }

    #[test]
    fn renders_header_with_page_and_score() {
        let hits = vec![chunk("Body text.", 0.5, Some(3))];
        assert_eq!(assemble_context(&hits, 100), "[page=3 score=0.5]\nBody text.");
    }

    #[test]
    fn renders_header_without_page() {
        let hits = vec![chunk("Body text.", 0.5, None)];
        assert_eq!(assemble_context(&hits, 100), "[score=0.5]\nBody text.");
    }

    #[test]
    fn separator_joins_consecutive_chunks() {
        let hits = vec![chunk("First.", 0.1, Some(1)), chunk("Second.", 0.2, Some(2))];
        let context = assemble_context(&hits, 1000);
        assert_eq!(
            context,
            "[page=1 score=0.1]\nFirst.\n\n---\n\n[page=2 score=0.2]\nSecond."
        );
    }

    #[test]
    fn result_never_exceeds_budget() {
        let hits: Vec<ScoredChunk> = (0..10)
            .map(|i| chunk(&"x".repeat(40), 0.1 * f64::from(i), Some(i64::from(i))))
            .collect();
        for max_chars in [0, 1, 10, 25, 47, 48, 49, 100, 1000] {
            let context = assemble_context(&hits, max_chars);
            assert!(
                char_len(&context) <= max_chars,
                "budget {max_chars} exceeded: {} chars",
                char_len(&context)
            );
        }
    }

    #[test]
    fn chunks_keep_their_given_order() {
        // Scores deliberately out of order: the assembler must not re-sort.
        let hits = vec![
            chunk("first", 0.9, None),
            chunk("second", 0.1, None),
            chunk("third", 0.5, None),
        ];
        let context = assemble_context(&hits, 1000);
        let first = context.find("first").unwrap();
        let second = context.find("second").unwrap();
        let third = context.find("third").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn only_the_last_emitted_chunk_is_truncated() {
        let hits = vec![
            chunk(&"a".repeat(30), 0.1, None),
            chunk(&"b".repeat(30), 0.2, None),
            chunk(&"c".repeat(30), 0.3, None),
        ];
        // Each rendered chunk is 12 ("[score=0.x]\n") + 30 = 42 chars; with
        // the 7-char separator the second chunk ends at 91, leaving 2 chars
        // of budget for the third.
        let context = assemble_context(&hits, 100);
        assert_eq!(char_len(&context), 100);
        assert_eq!(context.matches("a").count(), 30);
        assert_eq!(context.matches("b").count(), 30);
        // The third chunk is a strict prefix of its rendered form.
        assert!(context.ends_with("\n\n---\n\n[s"));
    }

    #[test]
    fn separator_counts_against_the_budget() {
        let hits = vec![chunk("aaaa", 0.1, None), chunk("bbbb", 0.2, None)];
        // First rendered chunk: "[score=0.1]\naaaa" = 16 chars. A budget of
        // 23 leaves 0 after the 7-char separator, so the second chunk must
        // not be emitted at all, not even as an empty suffix.
        let context = assemble_context(&hits, 23);
        assert_eq!(context, "[score=0.1]\naaaa");

        // One more character of budget admits exactly one char of chunk 2.
        let context = assemble_context(&hits, 24);
        assert_eq!(context, "[score=0.1]\naaaa\n\n---\n\n[");
    }

    #[test]
    fn stops_once_total_reaches_budget() {
        let hits = vec![chunk("abcd", 0.1, None), chunk("efgh", 0.2, None)];
        // "[score=0.1]\nabcd" is exactly 16 chars; the loop must stop there.
        let context = assemble_context(&hits, 16);
        assert_eq!(context, "[score=0.1]\nabcd");
    }

    #[test]
    fn truncation_is_deterministic() {
        let hits = vec![chunk(&"z".repeat(500), 0.3, Some(2))];
        let a = assemble_context(&hits, 77);
        let b = assemble_context(&hits, 77);
        assert_eq!(a, b);
    }

    #[test]
    fn hard_cut_respects_char_boundaries() {
        let hits = vec![chunk(&"é".repeat(40), 0.1, None)];
        let context = assemble_context(&hits, 20);
        assert_eq!(char_len(&context), 20);
        assert!(context.starts_with("[score=0.1]\n"));
    }

    #[test]
    fn capital_of_france_scenario() {
        let hits = vec![
            chunk(
                "Paris is the capital and most populous city of France.",
                0.1,
                Some(3),
            ),
            chunk("France's capital hosts the seat of government.", 0.2, Some(5)),
        ];
        let context = assemble_context(&hits, 50);
        assert!(context.starts_with("[page=3 score=0.1]\nParis is"));
        assert_eq!(char_len(&context), 50);
        // The second chunk is dropped entirely.
        assert!(!context.contains("page=5"));
    }
}
