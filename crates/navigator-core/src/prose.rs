//! Inline formatting for prose blocks.
//!
//! Prose is handled line by line: a line starting with `### `, `## ` or `- `
//! becomes a heading or list item, and single-backtick spans inside any line
//! become inline code. The HTML renderer escapes every piece of text before
//! wrapping it in markup, so generated content can never inject tags.

use crate::segmenter::{segment, ContentBlock};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Text,
    Heading2,
    Heading3,
    ListItem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Code(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProseLine {
    pub kind: LineKind,
    pub spans: Vec<Inline>,
}

impl ProseLine {
    /// Line text without markers or backticks
    pub fn plain_text(&self) -> String {
        self.spans
            .iter()
            .map(|span| match span {
                Inline::Text(text) | Inline::Code(text) => text.as_str(),
            })
            .collect()
    }
}

fn inline_code_pattern() -> &'static Regex {
    static INLINE_CODE: OnceLock<Regex> = OnceLock::new();
    INLINE_CODE.get_or_init(|| Regex::new(r"`([^`]+)`").expect("inline code pattern is valid"))
}

fn classify(line: &str) -> (LineKind, &str) {
    if let Some(rest) = line.strip_prefix("### ") {
        (LineKind::Heading3, rest)
    } else if let Some(rest) = line.strip_prefix("## ") {
        (LineKind::Heading2, rest)
    } else if let Some(rest) = line.strip_prefix("- ") {
        (LineKind::ListItem, rest)
    } else {
        (LineKind::Text, line)
    }
}

fn inline_spans(text: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in inline_code_pattern().captures_iter(text) {
        let (Some(whole), Some(code)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            spans.push(Inline::Text(text[last..whole.start()].to_string()));
        }
        spans.push(Inline::Code(code.as_str().to_string()));
        last = whole.end();
    }

    if last < text.len() {
        spans.push(Inline::Text(text[last..].to_string()));
    }

    spans
}

/// Break a prose block into classified lines.
pub fn prose_lines(text: &str) -> Vec<ProseLine> {
    text.split('\n')
        .map(|raw| {
            let raw = raw.strip_suffix('\r').unwrap_or(raw);
            let (kind, rest) = classify(raw);
            ProseLine {
                kind,
                spans: inline_spans(rest),
            }
        })
        .collect()
}

fn spans_to_html(spans: &[Inline]) -> String {
    let mut html = String::new();
    for span in spans {
        match span {
            Inline::Text(text) => html.push_str(&html_escape::encode_safe(text)),
            Inline::Code(code) => {
                html.push_str("<code>");
                html.push_str(&html_escape::encode_safe(code));
                html.push_str("</code>");
            }
        }
    }
    html
}

/// Render one prose block as an HTML fragment.
pub fn prose_to_html(text: &str) -> String {
    prose_lines(text)
        .iter()
        .map(|line| {
            let inner = spans_to_html(&line.spans);
            match line.kind {
                LineKind::Heading3 => format!("<h3>{inner}</h3>"),
                LineKind::Heading2 => format!("<h2>{inner}</h2>"),
                LineKind::ListItem => format!("<li>{inner}</li>"),
                LineKind::Text => inner,
            }
        })
        .collect::<Vec<_>>()
        .join("<br />")
}

/// Render a whole content body (prose and code) as an HTML fragment.
pub fn render_html(body: &str) -> String {
    let mut html = String::new();
    for block in segment(body) {
        match block {
            ContentBlock::Prose(text) => {
                html.push_str("<div class=\"prose\">");
                html.push_str(&prose_to_html(&text));
                html.push_str("</div>\n");
            }
            ContentBlock::Code { language, source } => {
                html.push_str("<pre><code class=\"language-");
                html.push_str(&html_escape::encode_double_quoted_attribute(&language));
                html.push_str("\">");
                html.push_str(&html_escape::encode_safe(&source));
                html.push_str("</code></pre>\n");
            }
        }
    }
    html
}
