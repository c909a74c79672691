use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::{info, warn};
use crate::app::{App, FocusPane, InputMode};
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick(),
        AppEvent::Completion(completion) => app.apply_completion(completion),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.next().next(),
        KeyCode::Char('t') => app.toggle_thinking_mode(),
        KeyCode::Char('i') => {
            app.start_editing();
        }
        _ => match app.focus {
            FocusPane::Sidebar => handle_sidebar_key(app, key),
            FocusPane::Content => handle_content_key(app, key),
            FocusPane::Chat => handle_chat_key(app, key),
        },
    }
}

fn handle_sidebar_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.sidebar_down(),
        KeyCode::Char('k') | KeyCode::Up => app.sidebar_up(),
        KeyCode::Char('g') | KeyCode::Home => app.sidebar_first(),
        KeyCode::Char('G') | KeyCode::End => app.sidebar_last(),
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.sidebar_enter(),
        _ => {}
    }
}

fn handle_content_key(app: &mut App, key: KeyEvent) {
    match key.code {
        // Half-page scroll
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_half_page_up();
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::PageDown => app.scroll_half_page_down(),
        KeyCode::PageUp => app.scroll_half_page_up(),
        KeyCode::Char('g') | KeyCode::Home => app.content_scroll = 0,
        KeyCode::Char('G') | KeyCode::End => {
            app.content_scroll = app.total_content_lines.saturating_sub(app.content_height);
        }
        KeyCode::Char(']') => app.next_code_block(),
        KeyCode::Char('[') => app.prev_code_block(),
        KeyCode::Char('y') => {
            if let Some(source) = app.selected_code_source() {
                if copy_to_clipboard(&source) {
                    app.mark_copied();
                }
            }
        }
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Esc => app.focus = FocusPane::Sidebar,
        _ => {}
    }
}

fn handle_chat_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            app.start_editing();
        }
        KeyCode::Char('j') | KeyCode::Down => app.chat_scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.chat_scroll_up(1),
        KeyCode::Char('G') | KeyCode::End => app.chat_scroll_down(u16::MAX),
        KeyCode::Char('g') | KeyCode::Home => app.chat_scroll_up(u16::MAX),
        KeyCode::Esc => app.focus = FocusPane::Sidebar,
        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => app.send_chat(),
        KeyCode::Backspace => {
            if app.chat_cursor > 0 {
                app.chat_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat_input.chars().count();
            if app.chat_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
                app.chat_input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.chat_cursor = app.chat_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat_input.chars().count();
            app.chat_cursor = (app.chat_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.chat_cursor = 0;
        }
        KeyCode::End => {
            app.chat_cursor = app.chat_input.chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(&app.chat_input, app.chat_cursor);
            app.chat_input.insert(byte_pos, c);
            app.chat_cursor += 1;
        }
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    // Scroll whichever pane is under the pointer
    let in_sidebar = app.sidebar_area.is_some_and(|r| point_in_rect(x, y, r));
    let in_content = app.content_area.is_some_and(|r| point_in_rect(x, y, r));
    let in_chat = app.chat_area.is_some_and(|r| point_in_rect(x, y, r));

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_content {
                for _ in 0..3 {
                    app.scroll_down();
                }
            } else if in_chat {
                app.chat_scroll_down(3);
            } else if in_sidebar {
                app.sidebar_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_content {
                for _ in 0..3 {
                    app.scroll_up();
                }
            } else if in_chat {
                app.chat_scroll_up(3);
            } else if in_sidebar {
                app.sidebar_up();
            }
        }
        _ => {}
    }
}

/// Copy to the system clipboard via the platform's command-line tool.
/// Returns `false` when no tool could take the text.
fn copy_to_clipboard(text: &str) -> bool {
    const TOOLS: [(&str, &[&str]); 3] = [
        ("pbcopy", &[]),
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
    ];

    if pipe_to_first(&TOOLS, text) {
        return true;
    }
    warn!("no clipboard tool available (tried pbcopy, wl-copy, xclip)");
    false
}

/// Pipe `text` into each tool in turn until one exits successfully
fn pipe_to_first(tools: &[(&str, &[&str])], text: &str) -> bool {
    use std::io::Write;
    use std::process::{Command, Stdio};

    for &(program, args) in tools {
        let Ok(mut child) = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        else {
            continue;
        };

        let written = child
            .stdin
            .take()
            .is_some_and(|mut stdin| stdin.write_all(text.as_bytes()).is_ok());
        if !written {
            let _ = child.kill();
        }
        // Dropping stdin above closes the pipe so the tool can finish.
        // Always reap the child, even after a failed write.
        let succeeded = child.wait().is_ok_and(|status| status.success());
        if written && succeeded {
            info!(program, bytes = text.len(), "copied code block");
            return true;
        }
    }
    false
}
