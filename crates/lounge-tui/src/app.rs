use std::sync::Arc;
use std::time::{Duration, Instant};

use lounge_core::shortcuts::{amenity_query, AMENITIES, SAMPLE_QUESTIONS};
use lounge_core::{ChatMessage, ChatSession, GeoError, GeoShortcut, NearbyQuery, SendOutcome};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::sync::mpsc::UnboundedSender;

use crate::tui::AppEvent;

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Samples,
    Input,
}

/// Short-lived notification drawn over the top-right corner
#[derive(Debug, Clone)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub is_error: bool,
    pub expires_at: Instant,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Chat
    pub session: ChatSession,
    pub query_input: String,
    pub query_cursor: usize, // cursor position in query_input, in chars
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub follow_bottom: bool,

    // Shortcuts
    pub sample_state: ListState,
    pub selected_amenity: Option<usize>,
    pub geo: Arc<GeoShortcut>,
    pub locating: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation
    pub toast: Option<Toast>,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub samples_area: Option<Rect>,

    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(session: ChatSession, geo: Arc<GeoShortcut>, events: UnboundedSender<AppEvent>) -> Self {
        let mut sample_state = ListState::default();
        sample_state.select(Some(0));

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            session,
            query_input: String::new(),
            query_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_bottom: true,

            sample_state,
            selected_amenity: None,
            geo,
            locating: false,

            animation_frame: 0,
            toast: None,

            chat_area: None,
            samples_area: None,

            events,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.session.is_busy()
    }

    /// Hand a question to the session without blocking the event loop.
    ///
    /// The session gate is taken before this returns, so back-to-back calls
    /// cannot both be accepted. Returns false when nothing was sent.
    pub fn send(&mut self, text: String) -> bool {
        match self.session.begin_send(&text) {
            Ok(_request) => {
                // Input stays disabled until the answer lands
                self.input_mode = InputMode::Normal;
                self.follow_bottom = true;
                true
            }
            Err(SendOutcome::Busy) => {
                self.notify("Busy", "Wait for the current answer, then try again", true);
                false
            }
            Err(_) => false,
        }
    }

    pub fn submit_input(&mut self) {
        let text = self.query_input.clone();
        if self.send(text) {
            self.query_input.clear();
            self.query_cursor = 0;
        }
    }

    pub fn send_selected_sample(&mut self) {
        if let Some(question) = self.sample_state.selected().and_then(|i| SAMPLE_QUESTIONS.get(i)) {
            self.send(question.to_string());
        }
    }

    pub fn send_amenity(&mut self, idx: usize) {
        let Some(label) = AMENITIES.get(idx) else {
            return;
        };
        if self.send(amenity_query(label)) {
            self.selected_amenity = Some(idx);
        }
    }

    /// Start the nearby-lounges lookup; the result comes back as `AppEvent::Located`.
    pub fn request_location(&mut self) {
        if self.locating {
            return;
        }
        self.locating = true;
        self.notify("Locating...", "Finding your current location", false);

        let geo = Arc::clone(&self.geo);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = geo.resolve().await;
            let _ = events.send(AppEvent::Located(result));
        });
    }

    pub fn on_located(&mut self, result: Result<NearbyQuery, GeoError>) {
        self.locating = false;
        match result {
            Ok(nearby) => {
                if self.send(nearby.question) {
                    self.notify(
                        "Location found!",
                        &format!("Searching for lounges near {}", nearby.place),
                        false,
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "nearby lounges lookup failed");
                self.notify("Error", &e.to_string(), true);
            }
        }
    }

    pub fn notify(&mut self, title: &str, message: &str, is_error: bool) {
        self.toast = Some(Toast {
            title: title.to_string(),
            message: message.to_string(),
            is_error,
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    /// Tick animation frame and expire notifications (called by Tick event)
    pub fn tick(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        if self.toast.as_ref().is_some_and(|t| t.expires_at <= Instant::now()) {
            self.toast = None;
        }
    }

    pub fn on_session_changed(&mut self) {
        if self.follow_bottom {
            let messages = self.session.messages();
            self.scroll_chat_to_bottom(&messages);
        }
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.follow_bottom = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half = (self.chat_height / 2).max(1);
        self.chat_scroll = self.chat_scroll.saturating_add(half);
    }

    pub fn scroll_half_page_up(&mut self) {
        self.follow_bottom = false;
        let half = (self.chat_height / 2).max(1);
        self.chat_scroll = self.chat_scroll.saturating_sub(half);
    }

    pub fn scroll_to_top(&mut self) {
        self.follow_bottom = false;
        self.chat_scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_bottom = true;
        let messages = self.session.messages();
        self.scroll_chat_to_bottom(&messages);
    }

    /// Scroll chat so the last message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self, messages: &[ChatMessage]) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in messages {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "AI:")
            for line in msg.content.lines() {
                // Use character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                let wrapped = if char_count == 0 { 1 } else { char_count / wrap_width + 1 };
                total_lines = total_lines.saturating_add(wrapped as u16);
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.is_busy() {
            total_lines = total_lines.saturating_add(2); // "AI:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    pub fn sample_nav_down(&mut self) {
        let i = self.sample_state.selected().unwrap_or(0);
        self.sample_state.select(Some((i + 1).min(SAMPLE_QUESTIONS.len() - 1)));
    }

    pub fn sample_nav_up(&mut self) {
        let i = self.sample_state.selected().unwrap_or(0);
        self.sample_state.select(Some(i.saturating_sub(1)));
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Chat => FocusPane::Samples,
            FocusPane::Samples => FocusPane::Input,
            FocusPane::Input => FocusPane::Chat,
        };
    }

    /// Enter editing mode unless a request is in flight
    pub fn start_editing(&mut self) {
        if self.is_busy() {
            return;
        }
        self.focus = FocusPane::Input;
        self.input_mode = InputMode::Editing;
    }
}
