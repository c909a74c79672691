use std::time::{Duration, Instant};
use navigator_core::{curriculum, segment, Completion, ContentBlock, Navigator, CURRICULUM};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;

/// How long the "copied" indicator stays up after `y`
pub const COPIED_FEEDBACK: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Sidebar,
    Content,
    Chat,
}

impl FocusPane {
    pub fn next(self) -> Self {
        match self {
            FocusPane::Sidebar => FocusPane::Content,
            FocusPane::Content => FocusPane::Chat,
            FocusPane::Chat => FocusPane::Sidebar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// One visible line of the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidebarRow {
    Section(usize),
    Topic(&'static str),
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub focus: FocusPane,
    pub input_mode: InputMode,
    pub navigator: Navigator,
    pub has_api_key: bool,

    // Sidebar state
    pub expanded: Vec<bool>,
    pub sidebar_state: ListState,

    // Content state
    pub content_scroll: u16,
    pub content_height: u16,
    pub total_content_lines: u16,
    pub selected_code: Option<usize>,
    pub code_block_rows: Vec<u16>, // Wrapped row of each code block header, set during render
    pub copied_at: Option<Instant>,

    // Chat state
    pub chat_input: String,
    pub chat_cursor: usize, // cursor position in chat_input, in chars
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub total_chat_lines: u16,
    pub follow_chat: bool, // Keep the newest message in view
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub sidebar_area: Option<Rect>,
    pub content_area: Option<Rect>,
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(navigator: Navigator, has_api_key: bool) -> Self {
        let mut sidebar_state = ListState::default();
        sidebar_state.select(Some(0));

        Self {
            should_quit: false,
            focus: FocusPane::Sidebar,
            input_mode: InputMode::Normal,
            navigator,
            has_api_key,

            expanded: vec![true; CURRICULUM.len()],
            sidebar_state,

            content_scroll: 0,
            content_height: 0,
            total_content_lines: 0,
            selected_code: None,
            code_block_rows: Vec::new(),
            copied_at: None,

            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            total_chat_lines: 0,
            follow_chat: true,
            animation_frame: 0,

            sidebar_area: None,
            content_area: None,
            chat_area: None,
        }
    }

    // Sidebar

    pub fn sidebar_rows(&self) -> Vec<SidebarRow> {
        let mut rows = Vec::new();
        for (i, section) in curriculum::sections().iter().enumerate() {
            rows.push(SidebarRow::Section(i));
            if self.expanded.get(i).copied().unwrap_or(true) {
                rows.extend(section.subtopics.iter().copied().map(SidebarRow::Topic));
            }
        }
        rows
    }

    pub fn selected_row(&self) -> Option<SidebarRow> {
        let rows = self.sidebar_rows();
        self.sidebar_state.selected().and_then(|i| rows.get(i).copied())
    }

    pub fn sidebar_down(&mut self) {
        let len = self.sidebar_rows().len();
        if len > 0 {
            let i = self.sidebar_state.selected().unwrap_or(0);
            self.sidebar_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn sidebar_up(&mut self) {
        let i = self.sidebar_state.selected().unwrap_or(0);
        self.sidebar_state.select(Some(i.saturating_sub(1)));
    }

    pub fn sidebar_first(&mut self) {
        self.sidebar_state.select(Some(0));
    }

    pub fn sidebar_last(&mut self) {
        let len = self.sidebar_rows().len();
        self.sidebar_state.select(Some(len.saturating_sub(1)));
    }

    /// Toggle a section or open a subtopic, depending on the selected row
    pub fn sidebar_enter(&mut self) {
        match self.selected_row() {
            Some(SidebarRow::Section(i)) => {
                if let Some(open) = self.expanded.get_mut(i) {
                    *open = !*open;
                }
            }
            Some(SidebarRow::Topic(topic)) => self.select_topic(topic),
            None => {}
        }
    }

    pub fn select_topic(&mut self, topic: &str) {
        if self.navigator.select_topic(topic) {
            self.content_scroll = 0;
            self.selected_code = None;
            self.code_block_rows.clear();
        }
    }

    // Content

    pub fn scroll_down(&mut self) {
        if self.content_scroll < self.total_content_lines.saturating_sub(self.content_height) {
            self.content_scroll = self.content_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.content_scroll = self.content_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.content_height / 2;
        let max_scroll = self.total_content_lines.saturating_sub(self.content_height);
        self.content_scroll = (self.content_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.content_height / 2;
        self.content_scroll = self.content_scroll.saturating_sub(half_page);
    }

    /// Sources of the code blocks in the loaded body, in order
    pub fn code_blocks(&self) -> Vec<String> {
        if self.navigator.topics().is_loading() {
            return Vec::new();
        }
        segment(self.navigator.topics().body())
            .filter_map(|block| match block {
                ContentBlock::Code { source, .. } => Some(source),
                ContentBlock::Prose(_) => None,
            })
            .collect()
    }

    pub fn next_code_block(&mut self) {
        let count = self.code_blocks().len();
        if count == 0 {
            return;
        }
        let next = match self.selected_code {
            Some(i) => (i + 1).min(count - 1),
            None => 0,
        };
        self.select_code_block(next);
    }

    pub fn prev_code_block(&mut self) {
        let count = self.code_blocks().len();
        if count == 0 {
            return;
        }
        let prev = self.selected_code.map_or(0, |i| i.saturating_sub(1));
        self.select_code_block(prev);
    }

    fn select_code_block(&mut self, index: usize) {
        self.selected_code = Some(index);
        if let Some(&row) = self.code_block_rows.get(index) {
            let max_scroll = self.total_content_lines.saturating_sub(self.content_height);
            self.content_scroll = row.min(max_scroll);
        }
    }

    pub fn selected_code_source(&self) -> Option<String> {
        self.selected_code
            .and_then(|i| self.code_blocks().into_iter().nth(i))
    }

    pub fn mark_copied(&mut self) {
        self.copied_at = Some(Instant::now());
    }

    pub fn show_copied(&self) -> bool {
        self.copied_at.is_some_and(|at| at.elapsed() < COPIED_FEEDBACK)
    }

    // Chat

    pub fn toggle_thinking_mode(&mut self) {
        self.navigator.toggle_thinking_mode();
    }

    /// Editing is refused while a query is in flight
    pub fn start_editing(&mut self) -> bool {
        if self.navigator.conversation().is_loading() {
            return false;
        }
        self.focus = FocusPane::Chat;
        self.input_mode = InputMode::Editing;
        true
    }

    pub fn send_chat(&mut self) {
        if self.navigator.send_message(&self.chat_input) {
            self.chat_input.clear();
            self.chat_cursor = 0;
            self.input_mode = InputMode::Normal;
            self.follow_chat = true;
        }
    }

    pub fn chat_scroll_down(&mut self, lines: u16) {
        let max_scroll = self.total_chat_lines.saturating_sub(self.chat_height);
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max_scroll);
        self.follow_chat = self.chat_scroll >= max_scroll;
    }

    pub fn chat_scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_chat = false;
    }

    pub fn apply_completion(&mut self, completion: Completion) {
        let is_answer = matches!(completion, Completion::Answer { .. });
        if self.navigator.apply(completion) && is_answer {
            self.follow_chat = true;
        }
    }

    pub fn tick(&mut self) {
        if self.navigator.conversation().is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if self.copied_at.is_some() && !self.show_copied() {
            self.copied_at = None;
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use navigator_core::{Message, Tutor};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    pub(crate) struct EchoTutor;

    #[async_trait]
    impl Tutor for EchoTutor {
        async fn fetch_topic_content(&self, topic: &str) -> String {
            format!("## {topic}\n```yaml\n- a\n```\ntext\n```\nls\n```")
        }

        async fn answer_query(&self, query: &str, _history: &[Message], _thinking: bool) -> String {
            format!("re: {query}")
        }
    }

    pub(crate) fn test_app() -> (App, mpsc::UnboundedReceiver<Completion>) {
        let (navigator, rx) = Navigator::new(Arc::new(EchoTutor));
        (App::new(navigator, true), rx)
    }

    #[tokio::test]
    async fn test_sidebar_starts_expanded() {
        let (app, _rx) = test_app();
        let rows = app.sidebar_rows();
        let topic_count: usize = CURRICULUM.iter().map(|s| s.subtopics.len()).sum();
        assert_eq!(rows.len(), CURRICULUM.len() + topic_count);
        assert_eq!(rows[0], SidebarRow::Section(0));
        assert_eq!(rows[1], SidebarRow::Topic(CURRICULUM[0].subtopics[0]));
    }

    #[tokio::test]
    async fn test_enter_on_section_collapses_it() {
        let (mut app, _rx) = test_app();
        app.sidebar_enter();
        let rows = app.sidebar_rows();
        assert_eq!(rows[1], SidebarRow::Section(1));

        app.sidebar_enter();
        assert_eq!(app.sidebar_rows()[1], SidebarRow::Topic(CURRICULUM[0].subtopics[0]));
    }

    #[tokio::test]
    async fn test_sidebar_navigation_clamps() {
        let (mut app, _rx) = test_app();
        app.sidebar_up();
        assert_eq!(app.sidebar_state.selected(), Some(0));
        app.sidebar_last();
        let last = app.sidebar_rows().len() - 1;
        app.sidebar_down();
        assert_eq!(app.sidebar_state.selected(), Some(last));
    }

    #[tokio::test]
    async fn test_enter_on_topic_loads_it() {
        let (mut app, mut rx) = test_app();
        app.sidebar_down();
        app.sidebar_enter();

        let topic = CURRICULUM[0].subtopics[0];
        assert_eq!(app.navigator.topics().active_topic(), Some(topic));
        assert!(app.code_blocks().is_empty(), "nothing to copy while loading");

        let completion = rx.recv().await.unwrap();
        app.apply_completion(completion);
        assert_eq!(app.code_blocks(), vec!["- a".to_string(), "ls".to_string()]);
    }

    #[tokio::test]
    async fn test_code_block_cursor() {
        let (mut app, mut rx) = test_app();
        app.prev_code_block();
        assert_eq!(app.selected_code, None, "no body yet");

        app.select_topic("Ansible Facts");
        let completion = rx.recv().await.unwrap();
        app.apply_completion(completion);

        app.next_code_block();
        assert_eq!(app.selected_code, Some(0));
        app.next_code_block();
        app.next_code_block();
        assert_eq!(app.selected_code, Some(1));
        assert_eq!(app.selected_code_source().as_deref(), Some("ls"));
        app.prev_code_block();
        assert_eq!(app.selected_code, Some(0));
    }

    #[tokio::test]
    async fn test_copied_indicator_expires() {
        let (mut app, _rx) = test_app();
        assert!(!app.show_copied());
        app.mark_copied();
        assert!(app.show_copied());

        app.copied_at = Some(Instant::now() - COPIED_FEEDBACK);
        app.tick();
        assert!(app.copied_at.is_none());
    }

    #[tokio::test]
    async fn test_send_clears_input_and_blocks_editing() {
        let (mut app, mut rx) = test_app();
        assert!(app.start_editing());
        app.chat_input = "What is idempotence?".into();
        app.chat_cursor = app.chat_input.chars().count();
        app.send_chat();

        assert!(app.chat_input.is_empty());
        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(!app.start_editing(), "input disabled while awaiting");

        let completion = rx.recv().await.unwrap();
        app.apply_completion(completion);
        assert!(app.start_editing());
        assert_eq!(app.navigator.conversation().history().len(), 3);
    }

    #[tokio::test]
    async fn test_blank_send_keeps_input() {
        let (mut app, _rx) = test_app();
        app.start_editing();
        app.chat_input = "   ".into();
        app.send_chat();
        assert_eq!(app.chat_input, "   ");
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn test_focus_cycles() {
        assert_eq!(FocusPane::Sidebar.next(), FocusPane::Content);
        assert_eq!(FocusPane::Content.next(), FocusPane::Chat);
        assert_eq!(FocusPane::Chat.next(), FocusPane::Sidebar);
    }
}
