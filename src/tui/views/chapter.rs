//! Chapter expansion view.
//!
//! Shows one chapter of a project: the expansion parameters, the chapter
//! text, and the diagnostics that come back with an expansion (retrieval
//! sources, critic review). The retrieval preview runs the same retrieval the
//! writer would, without writing anything.
//!
//! Expansion and preview share one request slot, so the preview toggle is
//! refused while an expansion is running and vice versa.
//!
//! Keybinds: i (edit instruction), w (edit target words), Esc/Enter (stop
//! editing), e (expand), p (toggle preview), R (refresh preview),
//! Tab (cycle panel), j/k (scroll), Esc (back to project).

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use tokio::sync::mpsc;

use super::super::theme;
use crate::config::GenerationConfig;
use crate::core::api::{
    non_empty, AgentLog, ApiResponse, ApiResult, ExpandChapterRequest, ExpandChapterResult,
    ProjectState, RagPreview, RagPreviewQuery,
};
use crate::core::derive::chunks_by_channel;
use crate::tui::request::RequestState;
use crate::tui::services::Services;
use crate::tui::widgets::agent_logs;
use crate::tui::widgets::chunk_list::chunk_list_lines;
use crate::tui::widgets::critic::critic_lines;
use crate::tui::widgets::input_buffer::InputBuffer;

// ── Constants ────────────────────────────────────────────────────────────────

/// Chunks requested by the retrieval preview.
pub const PREVIEW_TOP_K: u32 = 18;
pub const MIN_TARGET_WORDS: u32 = 200;
pub const MAX_TARGET_WORDS: u32 = 20_000;

const SCROLL_PAGE: u16 = 10;

// ── Types ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChapterAction {
    Load,
    Expand,
    Preview,
}

impl ChapterAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Load => "Loading chapter",
            Self::Expand => "Expanding chapter",
            Self::Preview => "Loading preview",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EditMode {
    None,
    Instruction,
    TargetWords,
}

/// Lower panel of the view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChapterPanel {
    Text,
    Preview,
    Sources,
    Critic,
    Logs,
}

impl ChapterPanel {
    const ALL: [ChapterPanel; 5] = [
        Self::Text,
        Self::Preview,
        Self::Sources,
        Self::Critic,
        Self::Logs,
    ];

    fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn label(self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::Preview => "Retrieval preview",
            Self::Sources => "Sources",
            Self::Critic => "Critic",
            Self::Logs => "Agent logs",
        }
    }
}

pub enum ChapterOutcome {
    Consumed,
    /// Return to the project view.
    Back,
}

type Snapshot = ApiResult<(ProjectState, Vec<AgentLog>)>;

enum ChapterMessage {
    Loaded(Snapshot),
    Expanded(ApiResult<(ExpandChapterResult, Vec<AgentLog>)>),
    Refreshed(Snapshot),
    Preview(ApiResult<RagPreview>),
    Finished,
}

// ── State ────────────────────────────────────────────────────────────────────

pub struct ChapterViewState {
    project_id: String,
    chapter: u32,
    project: Option<ProjectState>,
    logs: Vec<AgentLog>,
    text: String,
    instruction: InputBuffer,
    target_words: InputBuffer,
    default_target_words: u32,
    edit: EditMode,
    preview_on: bool,
    preview: Option<RagPreview>,
    expand_result: Option<ExpandChapterResult>,
    panel: ChapterPanel,
    request: RequestState<ChapterAction>,
    error: Option<String>,
    scroll: u16,
    tx: mpsc::UnboundedSender<ChapterMessage>,
    rx: mpsc::UnboundedReceiver<ChapterMessage>,
}

impl ChapterViewState {
    pub fn new(project_id: impl Into<String>, chapter: u32, generation: &GenerationConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            project_id: project_id.into(),
            chapter,
            project: None,
            logs: Vec::new(),
            text: String::new(),
            instruction: InputBuffer::new().with_text(&generation.chapter_instruction),
            target_words: InputBuffer::numeric()
                .with_text(&generation.chapter_target_words.to_string()),
            default_target_words: generation.chapter_target_words,
            edit: EditMode::None,
            preview_on: false,
            preview: None,
            expand_result: None,
            panel: ChapterPanel::Text,
            request: RequestState::default(),
            error: None,
            scroll: 0,
            tx,
            rx,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn chapter(&self) -> u32 {
        self.chapter
    }

    pub fn project(&self) -> Option<&ProjectState> {
        self.project.as_ref()
    }

    pub fn logs(&self) -> &[AgentLog] {
        &self.logs
    }

    /// Current chapter text buffer.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn expand_result(&self) -> Option<&ExpandChapterResult> {
        self.expand_result.as_ref()
    }

    pub fn preview(&self) -> Option<&RagPreview> {
        self.preview.as_ref()
    }

    pub fn is_preview_on(&self) -> bool {
        self.preview_on
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending(&self) -> Option<ChapterAction> {
        self.request.pending()
    }

    pub fn is_busy(&self) -> bool {
        !self.request.is_idle()
    }

    pub fn is_loading(&self) -> bool {
        self.request.is_pending(ChapterAction::Load)
    }

    /// True while a text field has the keyboard.
    pub fn is_editing(&self) -> bool {
        self.edit != EditMode::None
    }

    pub fn set_instruction(&mut self, text: &str) {
        self.instruction.set_text(text);
    }

    pub fn set_target_words(&mut self, text: &str) {
        self.target_words.set_text(text);
    }

    /// Expansion body. Target words fall back to the configured default when
    /// blank and are clamped to the accepted range.
    pub fn build_expand_request(&self) -> ExpandChapterRequest {
        let target_words = self
            .target_words
            .value_u32()
            .unwrap_or(self.default_target_words)
            .clamp(MIN_TARGET_WORDS, MAX_TARGET_WORDS);
        ExpandChapterRequest {
            instruction: non_empty(self.instruction.text()),
            target_words: Some(target_words),
        }
    }

    pub fn preview_query(&self) -> RagPreviewQuery {
        RagPreviewQuery {
            chapter: Some(self.chapter),
            query: Some(self.instruction.text().to_string()),
            top_k: Some(PREVIEW_TOP_K),
        }
    }

    /// Fetch the project snapshot. Takes the request slot like any other
    /// action, so a slow fetch cannot land on top of an expansion.
    pub fn load(&mut self, services: &Services) -> bool {
        if !self.request.try_begin(ChapterAction::Load) {
            log::debug!("Load refused: {:?} pending", self.request.pending());
            return false;
        }

        let api = services.api.clone();
        let id = self.project_id.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.get_project(&id).await.and_then(ApiResponse::into_parts);
            let _ = tx.send(ChapterMessage::Loaded(result));
            let _ = tx.send(ChapterMessage::Finished);
        });
        true
    }

    /// Expand the chapter, then re-fetch the snapshot.
    pub fn start_expand(&mut self, services: &Services) -> bool {
        if !self.request.try_begin(ChapterAction::Expand) {
            log::debug!("Expand refused: {:?} pending", self.request.pending());
            return false;
        }
        self.error = None;

        let payload = self.build_expand_request();
        let api = services.api.clone();
        let id = self.project_id.clone();
        let chapter = self.chapter;
        let tx = self.tx.clone();
        let notifier = services.notifier();
        tokio::spawn(async move {
            let result = api
                .expand_chapter(&id, chapter, &payload)
                .await
                .and_then(ApiResponse::into_parts);
            let succeeded = result.is_ok();
            if !succeeded {
                notifier.error(format!("Chapter {chapter} expansion failed"));
            }
            let _ = tx.send(ChapterMessage::Expanded(result));
            if succeeded {
                notifier.success(format!("Chapter {chapter} expanded"));
                let refreshed = api.get_project(&id).await.and_then(ApiResponse::into_parts);
                let _ = tx.send(ChapterMessage::Refreshed(refreshed));
            }
            let _ = tx.send(ChapterMessage::Finished);
        });
        true
    }

    /// Flip the retrieval preview. Turning it on fetches once; turning it off
    /// never fetches. Refused while a request is pending.
    pub fn toggle_preview(&mut self, services: &Services) -> bool {
        if self.is_busy() {
            return false;
        }
        self.preview_on = !self.preview_on;
        if self.preview_on {
            self.panel = ChapterPanel::Preview;
            self.refresh_preview(services);
        }
        true
    }

    /// Re-run the preview. Only while the preview is on.
    pub fn refresh_preview(&mut self, services: &Services) -> bool {
        if !self.preview_on || !self.request.try_begin(ChapterAction::Preview) {
            return false;
        }
        self.error = None;

        let query = self.preview_query();
        let api = services.api.clone();
        let id = self.project_id.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api
                .rag_preview(&id, &query)
                .await
                .and_then(ApiResponse::into_parts)
                .map(|(preview, _)| preview);
            let _ = tx.send(ChapterMessage::Preview(result));
            let _ = tx.send(ChapterMessage::Finished);
        });
        true
    }

    /// Drain the request channel. Call from on_tick.
    pub fn poll(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                ChapterMessage::Loaded(result) | ChapterMessage::Refreshed(result) => {
                    self.apply_snapshot(result)
                }
                ChapterMessage::Expanded(Ok((result, logs))) => {
                    self.text = result.text.clone();
                    self.expand_result = Some(result);
                    self.logs = logs;
                }
                ChapterMessage::Expanded(Err(e)) => {
                    log::warn!("Chapter {} expansion failed: {e}", self.chapter);
                    self.error = Some(e.to_string());
                }
                ChapterMessage::Preview(Ok(preview)) => self.preview = Some(preview),
                ChapterMessage::Preview(Err(e)) => {
                    log::warn!("Retrieval preview failed: {e}");
                    self.error = Some(e.to_string());
                }
                ChapterMessage::Finished => self.request.finish(),
            }
        }
    }

    /// Replace snapshot and logs. The text buffer is re-seeded only when the
    /// snapshot has this chapter.
    fn apply_snapshot(&mut self, result: Snapshot) {
        match result {
            Ok((project, logs)) => {
                if let Some(text) = project.chapter_text(self.chapter) {
                    self.text = text.to_string();
                }
                self.project = Some(project);
                self.logs = logs;
            }
            Err(e) => {
                log::warn!("Project {} fetch failed: {e}", self.project_id);
                self.error = Some(e.to_string());
            }
        }
    }

    // ── Input ────────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> Option<ChapterOutcome> {
        let Event::Key(key) = event else {
            return None;
        };
        if key.kind != KeyEventKind::Press {
            return None;
        }

        if self.is_editing() {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.edit = EditMode::None,
                _ => {
                    let buffer = match self.edit {
                        EditMode::TargetWords => &mut self.target_words,
                        _ => &mut self.instruction,
                    };
                    buffer.handle_key(key);
                }
            }
            return Some(ChapterOutcome::Consumed);
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('i')) => {
                self.edit = EditMode::Instruction;
                Some(ChapterOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('w')) => {
                self.edit = EditMode::TargetWords;
                Some(ChapterOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('e')) => {
                self.start_expand(services);
                Some(ChapterOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('p')) => {
                self.toggle_preview(services);
                Some(ChapterOutcome::Consumed)
            }
            (KeyModifiers::SHIFT | KeyModifiers::NONE, KeyCode::Char('R')) => {
                self.refresh_preview(services);
                Some(ChapterOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                self.panel = self.panel.next();
                self.scroll = 0;
                Some(ChapterOutcome::Consumed)
            }
            (_, KeyCode::BackTab) => {
                self.panel = self.panel.prev();
                self.scroll = 0;
                Some(ChapterOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                self.scroll = self.scroll.saturating_add(1);
                Some(ChapterOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.scroll = self.scroll.saturating_sub(1);
                Some(ChapterOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::PageDown) => {
                self.scroll = self.scroll.saturating_add(SCROLL_PAGE);
                Some(ChapterOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::PageUp) => {
                self.scroll = self.scroll.saturating_sub(SCROLL_PAGE);
                Some(ChapterOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Esc) => Some(ChapterOutcome::Back),
            _ => None,
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(7),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);

        self.render_header(frame, rows[0]);
        self.render_params(frame, rows[1]);
        self.render_panel_tabs(frame, rows[2]);
        self.render_panel(frame, rows[3]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(format!("Chapter {}", self.chapter), theme::title()),
            Span::styled(format!("  project {}", self.project_id), theme::muted()),
            Span::styled("  Esc:back to project", theme::dim()),
        ]);
        frame.render_widget(
            Paragraph::new(line).block(theme::block_default(" Chapter ")),
            area,
        );
    }

    fn render_params(&self, frame: &mut Frame, area: Rect) {
        let focused = self.is_editing();
        let block = if focused {
            theme::block_focused(" Expansion ")
        } else {
            theme::block_default(" Expansion ")
        };
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut instruction = self
            .instruction
            .render_line(self.edit == EditMode::Instruction, "no instruction");
        instruction.spans.insert(0, Span::styled("[i] Instruction   ", theme::muted()));
        let mut words = self
            .target_words
            .render_line(self.edit == EditMode::TargetWords, "200-20000");
        words.spans.insert(0, Span::styled("[w] Target words  ", theme::muted()));

        let pending = self.request.pending();
        let expand = if pending == Some(ChapterAction::Expand) {
            Span::styled(" Expanding... ", theme::highlight())
        } else {
            let style = if pending.is_some() { theme::dim() } else { theme::key_hint() };
            Span::styled(" [e] Expand ", style)
        };
        let toggle_style = if pending.is_some() { theme::dim() } else { theme::key_hint() };
        let toggle = if self.preview_on {
            Span::styled(" [p] Close preview ", toggle_style)
        } else {
            Span::styled(" [p] Retrieval preview ", toggle_style)
        };
        let mut buttons = vec![expand, toggle];
        if self.preview_on {
            let label = if pending == Some(ChapterAction::Preview) {
                " Loading... "
            } else {
                " [R] Refresh preview "
            };
            buttons.push(Span::styled(label, toggle_style));
        }

        let mut lines = vec![instruction, words, Line::raw(""), Line::from(buttons)];
        if let Some(ref error) = self.error {
            lines.push(Line::from(Span::styled(error.clone(), theme::error())));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_panel_tabs(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw(" ")];
        for panel in ChapterPanel::ALL {
            let style = if panel == self.panel {
                theme::highlight().add_modifier(Modifier::UNDERLINED)
            } else {
                theme::muted()
            };
            spans.push(Span::styled(format!(" {} ", panel.label()), style));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_panel(&self, frame: &mut Frame, area: Rect) {
        let lines = match self.panel {
            ChapterPanel::Logs => {
                agent_logs::render(frame, area, &self.logs, true, self.scroll);
                return;
            }
            ChapterPanel::Text => text_lines(&self.text, self.is_loading()),
            ChapterPanel::Preview => preview_lines(self.preview_on, self.preview.as_ref()),
            ChapterPanel::Sources => sources_lines(self.expand_result.as_ref()),
            ChapterPanel::Critic => match self.expand_result {
                Some(ref result) => critic_lines(&result.critic_issues, result.revised),
                None => vec![Line::from(Span::styled(
                    "  Expand the chapter to run the critic.",
                    theme::muted(),
                ))],
            },
        };
        frame.render_widget(
            Paragraph::new(lines)
                .block(theme::block_focused(self.panel.label()))
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0)),
            area,
        );
    }
}

// ── Line builders ────────────────────────────────────────────────────────────

fn text_lines(text: &str, loading: bool) -> Vec<Line<'static>> {
    if text.is_empty() {
        let message = if loading { "  Loading..." } else { "  (empty)" };
        return vec![Line::from(Span::styled(message, theme::muted()))];
    }
    text.lines().map(|l| Line::raw(l.to_string())).collect()
}

fn preview_lines(on: bool, preview: Option<&RagPreview>) -> Vec<Line<'static>> {
    if !on {
        return vec![Line::from(Span::styled(
            "  Retrieval preview is off. Press p to run it.",
            theme::muted(),
        ))];
    }
    let Some(preview) = preview else {
        return vec![Line::from(Span::styled("  Loading...", theme::muted()))];
    };

    let mut lines = vec![
        Line::from(Span::styled(
            "Vector and keyword recall, merged candidates, and the final selection.",
            theme::dim(),
        )),
        Line::raw(""),
        Line::from(Span::styled("Final context (template)", theme::heading())),
    ];
    lines.extend(
        preview
            .context_string
            .lines()
            .map(|l| Line::raw(format!("  {l}"))),
    );
    lines.push(Line::raw(""));

    let mut counts = vec![Span::styled("Final selection by channel:", theme::muted())];
    for (channel, chunks) in chunks_by_channel(&preview.final_selected) {
        counts.push(Span::raw(" "));
        counts.push(Span::styled(
            format!("{channel} {}", chunks.len()),
            Style::default().fg(theme::channel_color(channel)),
        ));
    }
    lines.push(Line::from(counts));
    lines.push(Line::raw(""));

    lines.extend(chunk_list_lines("Final selected (used for writing)", &preview.final_selected));
    lines.extend(chunk_list_lines("Vector recall", &preview.vector_results));
    lines.extend(chunk_list_lines("Keyword recall", &preview.keyword_results));
    lines.extend(chunk_list_lines("Merged candidates", &preview.merged_candidates));
    lines
}

fn sources_lines(result: Option<&ExpandChapterResult>) -> Vec<Line<'static>> {
    let Some(result) = result else {
        return vec![Line::from(Span::styled(
            "  Expand the chapter to see the context it was written from.",
            theme::muted(),
        ))];
    };
    let mut lines = vec![Line::from(Span::styled(
        "Context used (truncated)",
        theme::heading(),
    ))];
    lines.extend(result.context_used.lines().map(|l| Line::raw(format!("  {l}"))));
    lines.push(Line::raw(""));
    lines.extend(chunk_list_lines("Retrieved sources", &result.retrieved_context_sources));
    lines
}
