use std::future::Future;
use std::path::PathBuf;

use anyhow::Result;
use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::ask::{AskCycle, AskOutcome};
use crate::chat::MessageLog;
use crate::config::Config;
use crate::error::{describe, ClientError};
use crate::input::TextInput;
use crate::kms::KmsClient;
use crate::platform::{selected_platform, PlatformSelector};
use crate::tui::{AppEvent, EventSender};
use crate::upload::{Notice, UploadPanel, UploadStart};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Platform,
    Upload,
}

/// All client state, built once at startup.
pub struct App {
    pub should_quit: bool,
    pub focus: FocusPane,

    // Chat
    pub log: MessageLog,
    pub input: TextInput,
    pub ask: AskCycle,

    // Sidebar
    pub platform: Option<PlatformSelector>,
    pub upload: UploadPanel,

    // Modal prompt (upload results, validation)
    pub notice: Option<Notice>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Chat area geometry, updated during render
    pub chat_area: Option<Rect>,
    pub chat_height: u16,
    pub chat_width: u16,

    pub client: KmsClient,
    config_path: Option<PathBuf>,
    events: EventSender,
}

impl App {
    /// Fails when the config cannot produce a working client.
    pub fn new(config: &Config, events: EventSender) -> Result<Self> {
        config.validate()?;

        let client = KmsClient::new(&config.server_url(), config.request_timeout())?;
        let platform = PlatformSelector::new(config.platforms(), config.platform.as_deref());

        info!(
            server = client.base_url(),
            platform = selected_platform(platform.as_ref()),
            "client ready"
        );

        Ok(Self {
            should_quit: false,
            focus: FocusPane::Chat,

            log: MessageLog::new(),
            input: TextInput::new(),
            ask: AskCycle::new(),

            platform,
            upload: UploadPanel::new(),

            notice: None,

            animation_frame: 0,

            chat_area: None,
            chat_height: 0,
            chat_width: 0,

            client,
            config_path: None,
            events,
        })
    }

    /// Persist platform changes into this config file.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    pub fn platform_id(&self) -> &str {
        selected_platform(self.platform.as_ref())
    }

    pub fn controls_enabled(&self) -> bool {
        self.ask.controls_enabled()
    }

    /// Submit the chat input as a question, if the input allows it.
    pub fn submit_question(&mut self) {
        let platform = self.platform_id().to_string();
        let Some(request) = self.ask.begin(&mut self.log, &mut self.input, &platform) else {
            return;
        };

        let client = self.client.clone();
        self.spawn_request(
            async move { client.ask(&request.question, &request.platform).await },
            AppEvent::AskFinished,
        );
    }

    pub fn finish_ask(&mut self, result: Result<String, ClientError>) -> AskOutcome {
        let outcome = self.ask.finish(&mut self.log, result);
        self.focus = FocusPane::Chat;
        outcome
    }

    pub async fn apply_upload_path(&mut self) {
        if let Some(notice) = self.upload.apply_path().await {
            self.notice = Some(notice);
        }
    }

    pub fn start_upload(&mut self) {
        match self.upload.begin() {
            UploadStart::Send { file_name, bytes } => {
                let client = self.client.clone();
                self.spawn_request(
                    async move { client.upload(&file_name, bytes).await },
                    AppEvent::UploadFinished,
                );
            }
            UploadStart::Rejected(notice) => self.notice = Some(notice),
            UploadStart::Busy => debug!("upload already in flight"),
        }
    }

    pub fn finish_upload(&mut self, result: Result<String, ClientError>) {
        self.notice = Some(self.upload.finish(result));
    }

    /// Run a request in the background and report its result as an event.
    /// A task that dies without a result is reported as a network failure
    /// so the cycle waiting on it still ends.
    fn spawn_request<F>(&self, request: F, wrap: fn(Result<String, ClientError>) -> AppEvent)
    where
        F: Future<Output = Result<String, ClientError>> + Send + 'static,
    {
        let tx = self.events.clone();
        let handle = tokio::spawn(request);
        tokio::spawn(async move {
            let result = match handle.await {
                Ok(result) => result,
                Err(err) => Err(ClientError::Network(describe(&err))),
            };
            if tx.send(wrap(result)).is_err() {
                debug!("event loop gone, dropping request result");
            }
        });
    }

    pub fn next_platform(&mut self) {
        if let Some(selector) = &mut self.platform {
            selector.next();
            self.persist_platform();
        }
    }

    pub fn prev_platform(&mut self) {
        if let Some(selector) = &mut self.platform {
            selector.prev();
            self.persist_platform();
        }
    }

    fn persist_platform(&self) {
        let Some(path) = &self.config_path else {
            return;
        };

        // An unreadable file still holds the user's other settings
        let mut config = match Config::load_from(path) {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, path = %path.display(), "not saving platform choice");
                return;
            }
        };
        config.platform = Some(self.platform_id().to_string());
        if let Err(err) = config.save_to(path) {
            warn!(error = %err, "could not save platform choice");
        }
    }

    /// Tab order: chat, platform (when shown), upload.
    pub fn cycle_focus(&mut self, forward: bool) {
        let mut order = vec![FocusPane::Chat];
        if self.platform.is_some() {
            order.push(FocusPane::Platform);
        }
        order.push(FocusPane::Upload);

        let current = order.iter().position(|p| *p == self.focus).unwrap_or(0);
        let next = if forward {
            (current + 1) % order.len()
        } else {
            (current + order.len() - 1) % order.len()
        };
        self.focus = order[next];
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if !self.ask.controls_enabled() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.log.scroll_up(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.log.scroll_down(lines, self.visible_height());
    }

    /// Keep the newest message in view after something was rendered.
    pub fn follow_tail(&mut self) {
        if self.log.follow_tail {
            self.log.scroll_to_bottom(self.visible_height());
        }
    }

    // Default covers the first frame, before the chat area is known
    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 { self.chat_height } else { 20 }
    }
}
