/// Platform sent with a question when no selector is configured.
pub const DEFAULT_PLATFORM: &str = "gemini";

/// Platforms offered when the config does not list any.
pub fn default_platforms() -> Vec<String> {
    vec!["gemini".to_string(), "openai".to_string()]
}

/// The AI platform picker shown next to the chat.
#[derive(Debug, Clone)]
pub struct PlatformSelector {
    options: Vec<String>,
    selected: usize,
}

impl PlatformSelector {
    /// Returns `None` for an empty option list: the client then runs without
    /// a selector and asks with [`DEFAULT_PLATFORM`].
    pub fn new(options: Vec<String>, preferred: Option<&str>) -> Option<Self> {
        if options.is_empty() {
            return None;
        }

        let selected = preferred
            .and_then(|p| options.iter().position(|o| o.eq_ignore_ascii_case(p)))
            .unwrap_or(0);

        Some(Self { options, selected })
    }

    pub fn current(&self) -> &str {
        &self.options[self.selected]
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn next(&mut self) {
        self.selected = (self.selected + 1) % self.options.len();
    }

    pub fn prev(&mut self) {
        self.selected = (self.selected + self.options.len() - 1) % self.options.len();
    }
}

/// The platform id for a request: the selector's value, or the default.
pub fn selected_platform(selector: Option<&PlatformSelector>) -> &str {
    selector.map(|s| s.current()).unwrap_or(DEFAULT_PLATFORM)
}
