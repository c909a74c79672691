use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use navigator_core::{curriculum, segment, Role, TopicPhase};
use crate::app::{App, FocusPane, InputMode, SidebarRow};
use crate::markdown::{self, RenderedBody};

/// Lines above the body in the content viewer: title, rule, blank
const CONTENT_HEADER_LINES: usize = 3;

/// Ensure the selected item in a list is visible by adjusting the ListState offset.
fn ensure_selected_visible(state: &mut ListState, visible_height: usize) {
    let visible_height = visible_height.max(1);

    if let Some(selected) = state.selected() {
        // Valid offsets put the selection anywhere from the bottom row to the top row
        let min_offset = selected.saturating_sub(visible_height - 1);
        let max_offset = selected;

        let new_offset = state.offset().clamp(min_offset, max_offset);
        if new_offset != state.offset() {
            *state.offset_mut() = new_offset;
        }
    }
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    let [sidebar_area, content_area, chat_area] = Layout::horizontal([
        Constraint::Length(36),
        Constraint::Fill(1),
        Constraint::Length(48),
    ])
    .areas(body_area);

    // Store areas for mouse hit-testing
    app.sidebar_area = Some(sidebar_area);
    app.content_area = Some(content_area);
    app.chat_area = Some(chat_area);

    render_header(app, frame, header_area);
    render_sidebar(app, frame, sidebar_area);
    render_content(app, frame, content_area);
    render_chat(app, frame, chat_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![
        Span::styled(" Ansible Navigator AI ", Style::default().fg(Color::Red).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ];
    if !app.has_api_key {
        spans.push(Span::styled(
            "  no Gemini API key: set GEMINI_API_KEY or run `ansible-navigator set-key`",
            Style::default().fg(Color::Yellow),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = match (app.input_mode, app.focus) {
        (InputMode::Editing, _) => &[("Enter", "send"), ("Esc", "stop typing")],
        (InputMode::Normal, FocusPane::Sidebar) => &[
            ("j/k", "move"),
            ("Enter", "open"),
            ("Tab", "focus"),
            ("t", "thinking"),
            ("i", "ask"),
            ("q", "quit"),
        ],
        (InputMode::Normal, FocusPane::Content) => &[
            ("j/k", "scroll"),
            ("[ ]", "code block"),
            ("y", "copy"),
            ("Tab", "focus"),
            ("q", "quit"),
        ],
        (InputMode::Normal, FocusPane::Chat) => &[
            ("Enter/i", "ask"),
            ("j/k", "scroll"),
            ("t", "thinking"),
            ("Tab", "focus"),
            ("q", "quit"),
        ],
    };

    let mut spans = vec![
        Span::styled(mode_text, mode_style),
        Span::styled(" ", label_style),
    ];
    for (key, label) in pairs {
        spans.push(Span::styled(format!(" {key} "), key_style));
        spans.push(Span::styled(format!(" {label} "), label_style));
    }

    let footer = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    let active = app.navigator.topics().active_topic();

    let items: Vec<ListItem> = app
        .sidebar_rows()
        .into_iter()
        .map(|row| match row {
            SidebarRow::Section(i) => {
                let marker = if app.expanded.get(i).copied().unwrap_or(true) { "▾" } else { "▸" };
                let title = curriculum::sections().get(i).map_or("", |s| s.title);
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{marker} "), Style::default().fg(Color::DarkGray)),
                    Span::styled(title.to_string(), Style::default().add_modifier(Modifier::BOLD)),
                ]))
            }
            SidebarRow::Topic(topic) if Some(topic) == active => ListItem::new(Line::from(vec![
                Span::styled("  ● ", Style::default().fg(Color::Red)),
                Span::styled(topic.to_string(), Style::default().fg(Color::Red).bold()),
            ])),
            SidebarRow::Topic(topic) => ListItem::new(format!("    {topic}")),
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == FocusPane::Sidebar))
        .title(" Curriculum ");

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );

    let visible_height = area.height.saturating_sub(2) as usize;
    ensure_selected_visible(&mut app.sidebar_state, visible_height);

    frame.render_stateful_widget(list, area, &mut app.sidebar_state);
}

fn welcome_text() -> Text<'static> {
    Text::from(vec![
        Line::default(),
        Line::from(Span::styled(
            "Welcome to Ansible Navigator AI",
            Style::default().fg(Color::White).bold(),
        )),
        Line::default(),
        Line::from(Span::styled(
            "Select a topic from the sidebar to begin your learning journey.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(Span::styled(
            "For any questions, use the AI chat panel on the right.",
            Style::default().fg(Color::Gray),
        )),
    ])
    .alignment(Alignment::Center)
}

/// Placeholder bars shown while a lesson loads
fn loading_skeleton(width: u16) -> Text<'static> {
    let width = width as usize;
    let bar = |percent: usize| {
        Line::from(Span::styled(
            "▇".repeat(width * percent / 100),
            Style::default().fg(Color::DarkGray),
        ))
    };

    Text::from(vec![
        bar(75),
        Line::default(),
        bar(100),
        bar(83),
        Line::default(),
        bar(100),
        bar(100),
        bar(100),
        bar(100),
        Line::default(),
        bar(100),
        bar(50),
    ])
}

fn render_content(app: &mut App, frame: &mut Frame, area: Rect) {
    let inner_width = area.width.saturating_sub(2);
    app.content_height = area.height.saturating_sub(2);

    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == FocusPane::Content))
        .title(" Lesson ");
    if app.show_copied() {
        block = block.title_bottom(Line::from(" ✓ Copied ").fg(Color::Green).right_aligned());
    }

    let (text, rendered) = match app.navigator.topics().phase() {
        TopicPhase::Idle => (welcome_text(), None),
        TopicPhase::Loading { .. } => (loading_skeleton(inner_width), None),
        TopicPhase::Ready { topic, body } => {
            let body = markdown::render_blocks(segment(body), app.selected_code);
            let mut lines = vec![
                Line::from(Span::styled(
                    topic.to_string(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "━".repeat(topic.chars().count()),
                    Style::default().fg(Color::Red),
                )),
                Line::default(),
            ];
            lines.extend(body.lines.iter().cloned());
            (Text::from(lines), Some(body))
        }
    };

    match rendered {
        Some(RenderedBody { lines, code_starts }) => {
            let header_rows = CONTENT_HEADER_LINES as u16;
            let offsets = markdown::row_offsets(&lines, inner_width);
            let rows = offsets.last().copied().unwrap_or(0);
            app.total_content_lines = markdown::rows_u16(rows).saturating_add(header_rows);
            app.code_block_rows = code_starts
                .iter()
                .map(|&start| header_rows.saturating_add(markdown::rows_u16(offsets[start])))
                .collect();
        }
        None => {
            app.total_content_lines = 0;
            app.code_block_rows.clear();
            app.content_scroll = 0;
        }
    }

    let max_scroll = app.total_content_lines.saturating_sub(app.content_height);
    app.content_scroll = app.content_scroll.min(max_scroll);

    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.content_scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let [messages_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    let conversation = app.navigator.conversation();
    let thinking_mode = conversation.thinking_mode();
    let loading = conversation.is_loading();

    let thinking_label = if thinking_mode {
        Span::styled(" Thinking Mode: ON ", Style::default().fg(Color::Black).bg(Color::Red).bold())
    } else {
        Span::styled(" Thinking Mode: off ", Style::default().fg(Color::Gray))
    };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == FocusPane::Chat && app.input_mode == InputMode::Normal))
        .title(" AI Tutor ")
        .title(Line::from(thinking_label).right_aligned());

    let mut lines: Vec<Line> = Vec::new();
    for msg in conversation.history() {
        match msg.role() {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.extend(msg.text().lines().map(|line| Line::from(line.to_string())));
            }
            Role::Model => {
                lines.push(Line::from(Span::styled(
                    "Tutor:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(markdown::render_blocks(segment(msg.text()), None).lines);
            }
        }
        lines.push(Line::default());
    }

    if loading {
        lines.push(Line::from(Span::styled(
            "Tutor:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{dots}"),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let inner_width = messages_area.width.saturating_sub(2);
    app.chat_height = messages_area.height.saturating_sub(2);
    app.total_chat_lines = markdown::rows_u16(markdown::total_rows(&lines, inner_width));

    let max_scroll = app.total_chat_lines.saturating_sub(app.chat_height);
    app.chat_scroll = if app.follow_chat {
        max_scroll
    } else {
        app.chat_scroll.min(max_scroll)
    };

    let chat = Paragraph::new(lines)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, messages_area);

    render_chat_input(app, frame, input_area, thinking_mode, loading);
}

fn render_chat_input(app: &App, frame: &mut Frame, area: Rect, thinking_mode: bool, loading: bool) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing {
        Color::Yellow
    } else if loading {
        Color::Black
    } else {
        Color::DarkGray
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Ask ");

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.chat_cursor;

    // Keep the cursor visible by scrolling horizontally
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if loading {
        Paragraph::new(Span::styled(
            "Waiting for the tutor...",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else if app.chat_input.is_empty() && !editing {
        let placeholder = if thinking_mode {
            "Ask a complex question..."
        } else {
            "Ask a question..."
        };
        Paragraph::new(Span::styled(placeholder, Style::default().fg(Color::DarkGray)))
    } else {
        let visible_text: String = app
            .chat_input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };

    frame.render_widget(input.block(input_block), area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;
    use async_trait::async_trait;
    use navigator_core::{Message, Navigator, Tutor};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    /// Lessons made of long word-wrapped paragraphs with a marker on the last line
    struct LongLessonTutor;

    #[async_trait]
    impl Tutor for LongLessonTutor {
        async fn fetch_topic_content(&self, _topic: &str) -> String {
            let paragraph = "abcdefghijklmnopqrs ".repeat(30);
            format!("{}THE-END", format!("{paragraph}\n\n").repeat(10))
        }

        async fn answer_query(&self, query: &str, _history: &[Message], _thinking: bool) -> String {
            format!("re: {query}")
        }
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_ensure_selected_visible() {
        let mut state = ListState::default();
        state.select(Some(20));
        ensure_selected_visible(&mut state, 10);
        assert_eq!(state.offset(), 11);

        state.select(Some(3));
        ensure_selected_visible(&mut state, 10);
        assert_eq!(state.offset(), 3);
    }

    #[tokio::test]
    async fn test_welcome_screen_and_greeting() {
        let (mut app, _rx) = test_app();
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("Welcome to Ansible Navigator AI"));
        assert!(screen.contains("Hello! Ask me anything about Ansible."));
        assert!(screen.contains("Ask a question..."));
        assert!(screen.contains("1. Introduction to Ansible"));
    }

    #[tokio::test]
    async fn test_loaded_topic_renders_code_blocks() {
        let (mut app, mut rx) = test_app();
        app.select_topic("Ansible Facts");
        let completion = rx.recv().await.unwrap();
        app.apply_completion(completion);

        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("┌─ yaml ─"));
        assert!(screen.contains("┌─ bash ─"));
        assert_eq!(app.code_block_rows.len(), 2);
        assert!(app.code_block_rows[0] < app.code_block_rows[1]);
        assert!(app.code_block_rows[0] >= CONTENT_HEADER_LINES as u16);
    }

    #[tokio::test]
    async fn test_thinking_placeholder() {
        let (mut app, _rx) = test_app();
        app.toggle_thinking_mode();
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("Ask a complex question..."));
        assert!(screen.contains("Thinking Mode: ON"));
    }

    #[tokio::test]
    async fn test_end_of_long_lesson_is_reachable() {
        let (navigator, mut rx) = Navigator::new(Arc::new(LongLessonTutor));
        let mut app = App::new(navigator, true);
        app.select_topic("Ansible Facts");
        let completion = rx.recv().await.unwrap();
        app.apply_completion(completion);

        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(!screen_text(&terminal).contains("THE-END"));

        for _ in 0..500 {
            app.scroll_down();
        }
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        assert!(screen_text(&terminal).contains("THE-END"));
    }

    #[tokio::test]
    async fn test_chat_follows_newest_line() {
        let (mut app, _rx) = test_app();
        app.chat_input = "abcdefghi ".repeat(150);
        app.send_chat();
        assert!(app.navigator.conversation().is_loading());

        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        assert!(app.total_chat_lines > app.chat_height);
        assert!(screen_text(&terminal).contains("Thinking."));
    }
}
