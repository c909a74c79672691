//! Splits model output into prose and fenced code blocks.
//!
//! A fence is a triple-backtick line with an optional word-character language
//! tag, followed by content and a closing triple backtick. Anything that does
//! not form a complete fence (an unterminated opening marker, a tag with
//! spaces) stays in the surrounding prose, so segmentation never fails.

use regex::Regex;
use std::sync::OnceLock;

/// Language reported for fences that carry no tag.
pub const DEFAULT_LANGUAGE: &str = "bash";

/// One displayable piece of a content body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Prose(String),
    Code { language: String, source: String },
}

impl ContentBlock {
    pub fn prose(text: impl Into<String>) -> Self {
        ContentBlock::Prose(text.into())
    }

    pub fn code(language: impl Into<String>, source: impl Into<String>) -> Self {
        ContentBlock::Code {
            language: language.into(),
            source: source.into(),
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, ContentBlock::Code { .. })
    }
}

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?s)```(\w*)\n(.*?)```").expect("fence pattern is valid"))
}

struct Fence {
    start: usize,
    end: usize,
    language: String,
    source: String,
}

fn next_fence(text: &str, from: usize) -> Option<Fence> {
    let caps = fence_pattern().captures_at(text, from)?;
    let whole = caps.get(0)?;
    let tag = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let body = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

    Some(Fence {
        start: whole.start(),
        end: whole.end(),
        language: if tag.is_empty() {
            DEFAULT_LANGUAGE.to_string()
        } else {
            tag.to_string()
        },
        source: body.trim().to_string(),
    })
}

fn strip_leading_break(text: &str) -> &str {
    text.strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .unwrap_or(text)
}

fn strip_trailing_break(text: &str) -> &str {
    match text.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => text,
    }
}

/// Lazy block iterator over a content body.
///
/// Cloning the iterator saves its position; calling [`segment`] again on the
/// same text restarts from the beginning and yields the same blocks.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    text: &'a str,
    pos: usize,
    after_fence: bool,
    pending: Option<ContentBlock>,
}

/// Segment `text` into prose and code blocks, in input order.
pub fn segment(text: &str) -> Segments<'_> {
    Segments {
        text,
        pos: 0,
        after_fence: false,
        pending: None,
    }
}

impl Iterator for Segments<'_> {
    type Item = ContentBlock;

    fn next(&mut self) -> Option<ContentBlock> {
        loop {
            if let Some(block) = self.pending.take() {
                return Some(block);
            }
            if self.pos >= self.text.len() {
                return None;
            }

            let fence = next_fence(self.text, self.pos);
            let prose_end = fence.as_ref().map_or(self.text.len(), |f| f.start);

            let mut prose = &self.text[self.pos..prose_end];
            if self.after_fence {
                prose = strip_leading_break(prose);
            }

            match fence {
                Some(fence) => {
                    // The line break before an opening marker belongs to the fence
                    prose = strip_trailing_break(prose);
                    self.pos = fence.end;
                    self.after_fence = true;
                    self.pending = Some(ContentBlock::Code {
                        language: fence.language,
                        source: fence.source,
                    });
                }
                None => {
                    self.pos = self.text.len();
                    self.after_fence = false;
                }
            }

            if !prose.is_empty() {
                return Some(ContentBlock::Prose(prose.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(text: &str) -> Vec<ContentBlock> {
        segment(text).collect()
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert!(blocks("").is_empty());
    }

    #[test]
    fn test_plain_text_is_single_prose_block() {
        let text = "## Inventory\nHosts live in `inventory.ini`.\n- web\n- db\n";
        assert_eq!(blocks(text), vec![ContentBlock::prose(text)]);
    }

    #[test]
    fn test_fence_between_prose() {
        let got = blocks("a\n```yaml\nkey: 1\n```\nb");
        assert_eq!(
            got,
            vec![
                ContentBlock::prose("a"),
                ContentBlock::code("yaml", "key: 1"),
                ContentBlock::prose("b"),
            ]
        );
    }

    #[test]
    fn test_untagged_fence_defaults_to_bash() {
        assert_eq!(blocks("```\nx\n```"), vec![ContentBlock::code("bash", "x")]);
    }

    #[test]
    fn test_source_is_trimmed() {
        let got = blocks("```yaml\n\n  - hosts: all\n\n```");
        assert_eq!(got, vec![ContentBlock::code("yaml", "- hosts: all")]);
    }

    #[test]
    fn test_adjacent_fences_have_no_prose_between() {
        let got = blocks("```yaml\na: 1\n```\n```ini\n[web]\n```");
        assert_eq!(
            got,
            vec![ContentBlock::code("yaml", "a: 1"), ContentBlock::code("ini", "[web]")]
        );
    }

    #[test]
    fn test_unterminated_fence_is_prose() {
        let text = "Run this:\n```bash\nansible all -m ping\n";
        assert_eq!(blocks(text), vec![ContentBlock::prose(text)]);
    }

    #[test]
    fn test_tag_with_spaces_is_not_a_fence() {
        let text = "```yaml title\nkey: 1\n```";
        assert_eq!(blocks(text), vec![ContentBlock::prose(text)]);
    }

    #[test]
    fn test_only_one_break_is_absorbed_by_fence() {
        let got = blocks("intro\n\n```yaml\nk: v\n```\n\noutro");
        assert_eq!(
            got,
            vec![
                ContentBlock::prose("intro\n"),
                ContentBlock::code("yaml", "k: v"),
                ContentBlock::prose("\noutro"),
            ]
        );
    }

    #[test]
    fn test_crlf_breaks_around_fence() {
        let got = blocks("a\r\n```yaml\nk: v\n```\r\nb");
        assert_eq!(
            got,
            vec![
                ContentBlock::prose("a"),
                ContentBlock::code("yaml", "k: v"),
                ContentBlock::prose("b"),
            ]
        );
    }

    #[test]
    fn test_segments_are_restartable() {
        let text = "one\n```yaml\na: 1\n```\ntwo";
        let mut iter = segment(text);
        let first = iter.next();
        let saved = iter.clone();

        let rest: Vec<_> = iter.collect();
        let replay: Vec<_> = saved.collect();
        assert_eq!(rest, replay);

        let again: Vec<_> = segment(text).collect();
        assert_eq!(again.first(), first.as_ref());
        assert_eq!(again.len(), 3);
    }

    #[test]
    fn test_multibyte_prose_around_fence() {
        let got = blocks("héllo ✓\n```\necho ünïcode\n```\nfin");
        assert_eq!(
            got,
            vec![
                ContentBlock::prose("héllo ✓"),
                ContentBlock::code("bash", "echo ünïcode"),
                ContentBlock::prose("fin"),
            ]
        );
    }
}
