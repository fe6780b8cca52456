//! Project creation form.
//!
//! Six fields, one submit. The form is seeded with a sample premise so a
//! first run can go straight to Enter. Keybinds: Tab/Down (next field),
//! BackTab/Up (previous field), Enter or Ctrl+S (create).

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tokio::sync::mpsc;

use super::super::theme;
use crate::core::api::{non_empty, AgentLog, ApiResponse, ApiResult, CreateProjectRequest, ProjectState};
use crate::tui::request::RequestState;
use crate::tui::services::Services;
use crate::tui::widgets::agent_logs;
use crate::tui::widgets::input_buffer::InputBuffer;

// ── Constants ────────────────────────────────────────────────────────────────

pub const MIN_TARGET_CHAPTERS: u32 = 1;
pub const MAX_TARGET_CHAPTERS: u32 = 200;
const DEFAULT_TARGET_CHAPTERS: u32 = 10;

// ── Types ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    Genre,
    Style,
    Keywords,
    Audience,
    Setting,
    TargetChapters,
}

impl FormField {
    const ALL: [FormField; 6] = [
        Self::Genre,
        Self::Style,
        Self::Keywords,
        Self::Audience,
        Self::Setting,
        Self::TargetChapters,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn label(self) -> &'static str {
        match self {
            Self::Genre => "Genre",
            Self::Style => "Style",
            Self::Keywords => "Keywords",
            Self::Audience => "Audience",
            Self::Setting => "Setting",
            Self::TargetChapters => "Target chapters",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            Self::Genre => "required",
            Self::Style => "e.g. terse, fast-paced",
            Self::Keywords => "comma separated",
            Self::Audience => "who is this for",
            Self::Setting => "world and premise",
            Self::TargetChapters => "1-200",
        }
    }
}

pub enum CreateOutcome {
    /// Input consumed, view stays as-is.
    Consumed,
    /// Project created; open its detail view.
    OpenProject(String),
}

type CreateMessage = ApiResult<(ProjectState, Vec<AgentLog>)>;

// ── State ────────────────────────────────────────────────────────────────────

pub struct CreateProjectState {
    genre: InputBuffer,
    style: InputBuffer,
    keywords: InputBuffer,
    audience: InputBuffer,
    setting: InputBuffer,
    target_chapters: InputBuffer,
    focus: FormField,
    request: RequestState<()>,
    logs: Vec<AgentLog>,
    error: Option<String>,
    tx: mpsc::UnboundedSender<CreateMessage>,
    rx: mpsc::UnboundedReceiver<CreateMessage>,
}

impl CreateProjectState {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            genre: InputBuffer::new().with_text("Science fiction"),
            style: InputBuffer::new().with_text("Terse, fast-paced"),
            keywords: InputBuffer::new().with_text("space station, amnesia, conspiracy"),
            audience: InputBuffer::new().with_text("Adult readers of hard SF and mystery"),
            setting: InputBuffer::new().with_text(
                "A near-future orbital station, short on resources, torn between political factions.",
            ),
            target_chapters: InputBuffer::numeric()
                .with_text(&DEFAULT_TARGET_CHAPTERS.to_string()),
            focus: FormField::Genre,
            request: RequestState::default(),
            logs: Vec::new(),
            error: None,
            tx,
            rx,
        }
    }

    fn field(&self, field: FormField) -> &InputBuffer {
        match field {
            FormField::Genre => &self.genre,
            FormField::Style => &self.style,
            FormField::Keywords => &self.keywords,
            FormField::Audience => &self.audience,
            FormField::Setting => &self.setting,
            FormField::TargetChapters => &self.target_chapters,
        }
    }

    fn field_mut(&mut self, field: FormField) -> &mut InputBuffer {
        match field {
            FormField::Genre => &mut self.genre,
            FormField::Style => &mut self.style,
            FormField::Keywords => &mut self.keywords,
            FormField::Audience => &mut self.audience,
            FormField::Setting => &mut self.setting,
            FormField::TargetChapters => &mut self.target_chapters,
        }
    }

    /// Replace a field's contents.
    pub fn set_field(&mut self, field: FormField, text: &str) {
        self.field_mut(field).set_text(text);
    }

    pub fn is_busy(&self) -> bool {
        !self.request.is_idle()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn logs(&self) -> &[AgentLog] {
        &self.logs
    }

    /// Request body for the current form. The chapter count falls back to
    /// the default when blank and is clamped to the accepted range.
    pub fn build_request(&self) -> Result<CreateProjectRequest, String> {
        let genre = non_empty(self.genre.text()).ok_or_else(|| "Genre is required".to_string())?;
        let target_chapters = self
            .target_chapters
            .value_u32()
            .unwrap_or(DEFAULT_TARGET_CHAPTERS)
            .clamp(MIN_TARGET_CHAPTERS, MAX_TARGET_CHAPTERS);

        Ok(CreateProjectRequest {
            genre,
            setting: non_empty(self.setting.text()),
            style: non_empty(self.style.text()),
            keywords: non_empty(self.keywords.text()),
            audience: non_empty(self.audience.text()),
            target_chapters: Some(target_chapters),
        })
    }

    /// Send the create request. Returns false when nothing was sent, either
    /// because a request is already in flight or the form is invalid.
    pub fn submit(&mut self, services: &Services) -> bool {
        if self.is_busy() {
            return false;
        }
        let payload = match self.build_request() {
            Ok(payload) => payload,
            Err(message) => {
                self.error = Some(message);
                return false;
            }
        };
        if !self.request.try_begin(()) {
            return false;
        }
        self.error = None;

        let api = services.api.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api
                .create_project(&payload)
                .await
                .and_then(ApiResponse::into_parts);
            let _ = tx.send(result);
        });
        true
    }

    /// Drain the request channel. Call from on_tick.
    pub fn poll(&mut self) -> Option<CreateOutcome> {
        let result = self.rx.try_recv().ok()?;
        self.request.finish();
        match result {
            Ok((project, logs)) => {
                log::info!("Created project {}", project.id);
                self.logs = logs;
                Some(CreateOutcome::OpenProject(project.id))
            }
            Err(e) => {
                log::warn!("Project creation failed: {e}");
                self.error = Some(e.to_string());
                None
            }
        }
    }

    // ── Input ────────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> Option<CreateOutcome> {
        let Event::Key(key) = event else {
            return None;
        };
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Tab | KeyCode::Down) => {
                self.focus = self.focus.next();
                Some(CreateOutcome::Consumed)
            }
            (_, KeyCode::BackTab) | (KeyModifiers::NONE, KeyCode::Up) => {
                self.focus = self.focus.prev();
                Some(CreateOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Enter) | (KeyModifiers::CONTROL, KeyCode::Char('s')) => {
                self.submit(services);
                Some(CreateOutcome::Consumed)
            }
            _ => {
                let focus = self.focus;
                self.field_mut(focus)
                    .handle_key(key)
                    .then_some(CreateOutcome::Consumed)
            }
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        self.render_form(frame, chunks[0]);
        agent_logs::render(frame, chunks[1], &self.logs, false, 0);
    }

    fn render_form(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_focused("New project");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![Line::raw("")];
        for field in FormField::ALL {
            let focused = field == self.focus;
            let label_style = if focused {
                theme::highlight()
            } else {
                theme::muted()
            };
            let marker = if focused { "▸ " } else { "  " };
            lines.push(Line::from(vec![
                Span::styled(marker, theme::highlight()),
                Span::styled(format!("{:<16}", field.label()), label_style),
            ]));
            let mut value = self.field(field).render_line(focused, field.placeholder());
            value.spans.insert(0, Span::raw("    "));
            lines.push(value);
            lines.push(Line::raw(""));
        }

        let button = if self.is_busy() {
            Span::styled(" Creating... ", theme::muted())
        } else {
            Span::styled(
                " Create project ",
                Style::default()
                    .fg(theme::BG_BASE)
                    .bg(theme::PRIMARY)
                    .add_modifier(Modifier::BOLD),
            )
        };
        lines.push(Line::from(vec![Span::raw("  "), button]));

        if let Some(ref error) = self.error {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(format!("  {error}"), theme::error())));
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("  Tab/↑↓", theme::key_hint()),
            Span::raw(":field "),
            Span::styled("Enter", theme::key_hint()),
            Span::raw(":create"),
        ]));

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl Default for CreateProjectState {
    fn default() -> Self {
        Self::new()
    }
}
