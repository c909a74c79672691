use navigator_core::prose::{prose_lines, Inline, LineKind, ProseLine};
use navigator_core::ContentBlock;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

/// Styled lines for a segmented body, plus where each code block starts.
#[derive(Debug, Default)]
pub struct RenderedBody {
    pub lines: Vec<Line<'static>>,
    /// Index into `lines` of each code block's header, in block order
    pub code_starts: Vec<usize>,
}

fn inline_code_style() -> Style {
    Style::default().fg(Color::Yellow)
}

fn prose_line(line: &ProseLine) -> Line<'static> {
    let base = match line.kind {
        LineKind::Heading2 => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        LineKind::Heading3 => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        LineKind::ListItem | LineKind::Text => Style::default(),
    };

    let mut spans = Vec::with_capacity(line.spans.len() + 1);
    if line.kind == LineKind::ListItem {
        spans.push(Span::styled("  • ", Style::default().fg(Color::Red)));
    }
    for span in &line.spans {
        match span {
            Inline::Text(text) => spans.push(Span::styled(text.clone(), base)),
            Inline::Code(code) => spans.push(Span::styled(code.clone(), base.patch(inline_code_style()))),
        }
    }
    Line::from(spans)
}

fn code_lines(language: &str, source: &str, selected: bool, out: &mut Vec<Line<'static>>) {
    let border = if selected {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut header = vec![
        Span::styled("┌─ ", border),
        Span::styled(
            language.to_string(),
            Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ─", border),
    ];
    if selected {
        header.push(Span::styled(
            "  [y] copy",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ));
    }
    out.push(Line::from(header));

    for code_line in source.strip_suffix('\n').unwrap_or(source).split('\n') {
        out.push(Line::from(vec![
            Span::styled("│ ", border),
            Span::styled(code_line.to_string(), Style::default().fg(Color::Green)),
        ]));
    }
    out.push(Line::from(Span::styled("└─", border)));
}

/// Render blocks to terminal lines. `selected_code` highlights the n-th code
/// block (counting code blocks only).
pub fn render_blocks(
    blocks: impl IntoIterator<Item = ContentBlock>,
    selected_code: Option<usize>,
) -> RenderedBody {
    let mut body = RenderedBody::default();

    for block in blocks {
        match block {
            ContentBlock::Prose(text) => {
                body.lines.extend(prose_lines(&text).iter().map(prose_line));
            }
            ContentBlock::Code { language, source } => {
                let index = body.code_starts.len();
                body.code_starts.push(body.lines.len());
                code_lines(&language, &source, selected_code == Some(index), &mut body.lines);
            }
        }
    }

    body
}

/// Rows a line occupies once word-wrapped to `width` columns, counted by the
/// same wrapper the viewer renders with
pub fn wrapped_height(line: &Line, width: u16) -> usize {
    Paragraph::new(line.clone())
        .wrap(Wrap { trim: false })
        .line_count(width)
}

/// Row at which each line starts after wrapping, followed by the total row count
pub fn row_offsets(lines: &[Line], width: u16) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(lines.len() + 1);
    let mut row = 0;
    offsets.push(row);
    for line in lines {
        row += wrapped_height(line, width);
        offsets.push(row);
    }
    offsets
}

/// Total rows after wrapping
pub fn total_rows(lines: &[Line], width: u16) -> usize {
    lines.iter().map(|line| wrapped_height(line, width)).sum()
}

/// Clamp a row count to what a scroll offset can hold
pub fn rows_u16(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use navigator_core::segment;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_prose_and_code_layout() {
        let body = "## Play\nRun `ansible-playbook`.\n```yaml\n- hosts: all\n  become: true\n```\n- done";
        let rendered = render_blocks(segment(body), None);
        let texts: Vec<String> = rendered.lines.iter().map(text_of).collect();

        assert_eq!(
            texts,
            vec![
                "Play",
                "Run ansible-playbook.",
                "┌─ yaml ─",
                "│ - hosts: all",
                "│   become: true",
                "└─",
                "  • done",
            ]
        );
        assert_eq!(rendered.code_starts, vec![2]);
    }

    #[test]
    fn test_inline_code_is_styled() {
        let rendered = render_blocks(segment("Use `become`"), None);
        let line = &rendered.lines[0];
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.spans[1].content, "become");
        assert_eq!(line.spans[1].style.fg, Some(Color::Yellow));
    }

    #[test]
    fn test_selected_block_shows_copy_hint() {
        let body = "```\nls\n```\ntext\n```sh\npwd\n```";
        let rendered = render_blocks(segment(body), Some(1));
        assert_eq!(rendered.code_starts, vec![0, 4]);
        assert!(!text_of(&rendered.lines[0]).contains("copy"));
        assert!(text_of(&rendered.lines[4]).contains("[y] copy"));
        assert_eq!(text_of(&rendered.lines[0]), "┌─ bash ─");
    }

    #[test]
    fn test_wrapped_rows_break_at_words() {
        // 20 characters, but no third word fits beside the first two
        let words = Line::from("aaaaaa bbbbbb cccccc");
        assert_eq!(wrapped_height(&words, 10), 3);

        let long_word = Line::from("x".repeat(25));
        assert_eq!(wrapped_height(&long_word, 10), 3);
        assert_eq!(wrapped_height(&Line::default(), 10), 1);
    }

    #[test]
    fn test_row_offsets() {
        let lines = vec![
            Line::from("aaaaaa bbbbbb cccccc"),
            Line::default(),
            Line::from("short"),
        ];
        assert_eq!(row_offsets(&lines, 10), vec![0, 3, 4, 5]);
        assert_eq!(total_rows(&lines, 10), 5);
        assert_eq!(total_rows(&lines, 0), 0);
    }

    #[test]
    fn test_rows_u16_saturates() {
        assert_eq!(rows_u16(42), 42);
        assert_eq!(rows_u16(70_000), u16::MAX);
    }
}
