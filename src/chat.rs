//! Chat log state shared by the ask cycle and the renderer.

/// Who produced a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// Handle returned by [`MessageLog::render`]; the only way to remove a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(u64);

/// A single entry of the chat log. Never edited after it is rendered.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub is_error: bool,
}

/// Append-only message log (plus single removals) with tail-follow scrolling.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<ChatMessage>,
    next_id: u64,
    /// Scroll offset in wrapped lines from the top.
    pub scroll: u16,
    /// When set, the next draw scrolls so the newest message is visible.
    pub follow_tail: bool,
    rendered_lines: u16,
    last_height: u16,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and make sure it will be scrolled into view.
    pub fn render(&mut self, text: impl Into<String>, sender: Sender, is_error: bool) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id,
            sender,
            text: text.into(),
            is_error,
        });
        self.follow_tail = true;
        id
    }

    /// Remove the message with this handle. Returns false if it was already gone.
    pub fn remove(&mut self, id: MessageId) -> bool {
        match self.messages.iter().position(|m| m.id == id) {
            Some(idx) => {
                self.messages.remove(idx);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[cfg(test)]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Record how many lines the log takes once wrapped for display.
    /// Scrolling is bounded by this count.
    pub fn set_rendered_lines(&mut self, lines: u16) {
        self.rendered_lines = lines;
        self.scroll = self.scroll.min(self.max_scroll_for(self.last_height));
    }

    fn max_scroll_for(&self, height: u16) -> u16 {
        self.rendered_lines.saturating_sub(height)
    }

    /// Scroll so the last line is at the bottom of a `height`-line viewport.
    pub fn scroll_to_bottom(&mut self, height: u16) {
        self.last_height = height;
        self.scroll = self.max_scroll_for(height);
        self.follow_tail = false;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_tail = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16, height: u16) {
        self.last_height = height;
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll_for(height));
    }
}

/// Make text safe to hand to the terminal as-is.
///
/// Control characters (ESC and friends) are replaced with their escaped
/// form so message content can never drive the terminal. Newlines are kept,
/// tabs become spaces.
pub fn literal_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push('\n'),
            '\t' => out.push_str("    "),
            '\r' => {}
            c if c.is_control() => out.extend(c.escape_default()),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_appends_and_returns_handle() {
        let mut log = MessageLog::new();
        let first = log.render("hello", Sender::User, false);
        let second = log.render("hi there", Sender::Assistant, false);

        assert_ne!(first, second);
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().map(|m| m.text.as_str()), Some("hi there"));
        assert!(log.follow_tail);
    }

    #[test]
    fn test_remove_only_targets_handle() {
        let mut log = MessageLog::new();
        log.render("question", Sender::User, false);
        let placeholder = log.render("processing", Sender::Assistant, false);
        log.render("answer", Sender::Assistant, false);

        assert!(log.remove(placeholder));
        assert!(!log.remove(placeholder));
        let texts: Vec<_> = log.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["question", "answer"]);
    }

    #[test]
    fn test_ids_are_not_reused_after_removal() {
        let mut log = MessageLog::new();
        let a = log.render("a", Sender::User, false);
        log.remove(a);
        let b = log.render("b", Sender::User, false);
        assert_ne!(a, b);
    }

    #[test]
    fn test_literal_text_escapes_terminal_controls() {
        let text = "hi \u{1b}[31mred\u{1b}[0m\u{7}";
        let safe = literal_text(text);
        assert!(!safe.chars().any(|c| c.is_control()));
        assert!(safe.contains("\\u{1b}[31mred"));
    }

    #[test]
    fn test_literal_text_keeps_markup_as_is() {
        assert_eq!(literal_text("**bold** <b>x</b>"), "**bold** <b>x</b>");
        assert_eq!(literal_text("a\tb\r\nc"), "a    b\nc");
    }

    #[test]
    fn test_scroll_to_bottom_and_clamp() {
        let mut log = MessageLog::new();
        log.set_rendered_lines(30);

        log.scroll_to_bottom(12);
        assert_eq!(log.scroll, 18);
        assert!(!log.follow_tail);

        log.scroll_down(100, 12);
        assert_eq!(log.scroll, 18);
        log.scroll_up(5);
        assert_eq!(log.scroll, 13);
        log.scroll_down(3, 12);
        assert_eq!(log.scroll, 16);
    }

    #[test]
    fn test_shrinking_content_pulls_scroll_back() {
        let mut log = MessageLog::new();
        log.set_rendered_lines(40);
        log.scroll_to_bottom(10);
        assert_eq!(log.scroll, 30);

        log.set_rendered_lines(15);
        assert_eq!(log.scroll, 5);
    }
}
