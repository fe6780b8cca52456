//! Project detail view.
//!
//! Two tabs over one snapshot:
//! - **Overview**: outline, character cards, and the generated-chapter list.
//! - **Knowledge base**: per-source chunk counts from the retrieval index.
//!
//! Outline, characters, and stats share one request slot; starting any of
//! them while another is pending does nothing. Mutations re-fetch the
//! snapshot before the slot is released.
//!
//! Keybinds: o (outline), c (characters), Tab (switch tab), r (refresh),
//! j/k (select chapter), Enter (open chapter), n (next unwritten chapter).

use std::future::Future;

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
use crate::core::api::{
    non_empty, AgentLog, ApiResponse, ApiResult, CharactersRequest, OutlineRequest, ProjectState,
    RagStats,
};
use crate::core::derive::{chapter_numbers, format_timestamp, next_unwritten_chapter};
use crate::tui::request::RequestState;
use crate::tui::services::{Notifier, Services};
use crate::tui::widgets::agent_logs;

// ── Types ────────────────────────────────────────────────────────────────────

/// Request kinds sharing the project view's slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectAction {
    Load,
    Outline,
    Characters,
    RagStats,
}

impl ProjectAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Load => "Loading project",
            Self::Outline => "Generating outline",
            Self::Characters => "Generating characters",
            Self::RagStats => "Refreshing knowledge base",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectTab {
    Overview,
    KnowledgeBase,
}

impl ProjectTab {
    fn label(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::KnowledgeBase => "Knowledge base",
        }
    }
}

/// One row of the chapter list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChapterEntry {
    Written(u32),
    Next(u32),
}

impl ChapterEntry {
    pub fn number(self) -> u32 {
        match self {
            Self::Written(n) | Self::Next(n) => n,
        }
    }
}

pub enum ProjectOutcome {
    Consumed,
    OpenChapter(u32),
}

type Snapshot = ApiResult<(ProjectState, Vec<AgentLog>)>;

enum ProjectMessage {
    Loaded(Snapshot),
    Mutated(Snapshot),
    Refreshed(Snapshot),
    Stats(ApiResult<RagStats>),
    Finished,
}

// ── State ────────────────────────────────────────────────────────────────────

pub struct ProjectViewState {
    project_id: String,
    project: Option<ProjectState>,
    logs: Vec<AgentLog>,
    tab: ProjectTab,
    rag_stats: Option<RagStats>,
    error: Option<String>,
    request: RequestState<ProjectAction>,
    selected: usize,
    scroll: u16,
    tx: mpsc::UnboundedSender<ProjectMessage>,
    rx: mpsc::UnboundedReceiver<ProjectMessage>,
}

impl ProjectViewState {
    pub fn new(project_id: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            project_id: project_id.into(),
            project: None,
            logs: Vec::new(),
            tab: ProjectTab::Overview,
            rag_stats: None,
            error: None,
            request: RequestState::default(),
            selected: 0,
            scroll: 0,
            tx,
            rx,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn project(&self) -> Option<&ProjectState> {
        self.project.as_ref()
    }

    pub fn logs(&self) -> &[AgentLog] {
        &self.logs
    }

    pub fn rag_stats(&self) -> Option<&RagStats> {
        self.rag_stats.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn tab(&self) -> ProjectTab {
        self.tab
    }

    pub fn pending(&self) -> Option<ProjectAction> {
        self.request.pending()
    }

    pub fn is_busy(&self) -> bool {
        !self.request.is_idle()
    }

    pub fn is_loading(&self) -> bool {
        self.request.is_pending(ProjectAction::Load)
    }

    /// Fetch the snapshot. Holds the request slot, so it never overlaps a
    /// mutation and its refresh.
    pub fn load(&mut self, services: &Services) -> bool {
        if !self.request.try_begin(ProjectAction::Load) {
            log::debug!("Load refused: {:?} pending", self.request.pending());
            return false;
        }

        let api = services.api.clone();
        let id = self.project_id.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.get_project(&id).await.and_then(ApiResponse::into_parts);
            let _ = tx.send(ProjectMessage::Loaded(result));
            let _ = tx.send(ProjectMessage::Finished);
        });
        true
    }

    pub fn start_outline(&mut self, services: &Services) -> bool {
        let payload = OutlineRequest {
            theme: non_empty(&services.generation.outline_theme),
            total_words: Some(services.generation.outline_total_words),
        };
        let api = services.api.clone();
        let id = self.project_id.clone();
        self.spawn_mutation(services, ProjectAction::Outline, "Outline updated", async move {
            api.generate_outline(&id, &payload).await
        })
    }

    pub fn start_characters(&mut self, services: &Services) -> bool {
        let payload = CharactersRequest {
            constraints: non_empty(&services.generation.character_constraints),
        };
        let api = services.api.clone();
        let id = self.project_id.clone();
        self.spawn_mutation(services, ProjectAction::Characters, "Characters updated", async move {
            api.generate_characters(&id, &payload).await
        })
    }

    /// Run a snapshot-returning mutation, then re-fetch the snapshot. The
    /// slot is released only after the re-fetch resolves.
    fn spawn_mutation<F>(
        &mut self,
        services: &Services,
        action: ProjectAction,
        success: &'static str,
        request: F,
    ) -> bool
    where
        F: Future<Output = ApiResult<ApiResponse<ProjectState>>> + Send + 'static,
    {
        if !self.request.try_begin(action) {
            log::debug!("{} refused: {:?} pending", action.label(), self.request.pending());
            return false;
        }
        self.error = None;

        let api = services.api.clone();
        let id = self.project_id.clone();
        let tx = self.tx.clone();
        let notifier: Notifier = services.notifier();
        tokio::spawn(async move {
            let result = request.await.and_then(ApiResponse::into_parts);
            let succeeded = result.is_ok();
            if !succeeded {
                notifier.error(format!("{} failed", action.label()));
            }
            let _ = tx.send(ProjectMessage::Mutated(result));
            if succeeded {
                notifier.success(success);
                let refreshed = api.get_project(&id).await.and_then(ApiResponse::into_parts);
                let _ = tx.send(ProjectMessage::Refreshed(refreshed));
            }
            let _ = tx.send(ProjectMessage::Finished);
        });
        true
    }

    pub fn refresh_stats(&mut self, services: &Services) -> bool {
        if !self.request.try_begin(ProjectAction::RagStats) {
            return false;
        }
        self.error = None;

        let api = services.api.clone();
        let id = self.project_id.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api
                .rag_stats(&id)
                .await
                .and_then(ApiResponse::into_parts)
                .map(|(stats, _)| stats);
            let _ = tx.send(ProjectMessage::Stats(result));
            let _ = tx.send(ProjectMessage::Finished);
        });
        true
    }

    /// Switch to the knowledge base tab, loading stats the first time.
    /// Refused while a request is pending.
    pub fn open_knowledge_base(&mut self, services: &Services) -> bool {
        if self.is_busy() {
            return false;
        }
        self.tab = ProjectTab::KnowledgeBase;
        self.scroll = 0;
        if self.rag_stats.is_none() {
            self.refresh_stats(services);
        }
        true
    }

    pub fn open_overview(&mut self) {
        self.tab = ProjectTab::Overview;
        self.scroll = 0;
    }

    /// Drain the request channel. Call from on_tick.
    pub fn poll(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            match message {
                ProjectMessage::Loaded(result)
                | ProjectMessage::Mutated(result)
                | ProjectMessage::Refreshed(result) => self.apply_snapshot(result),
                ProjectMessage::Stats(Ok(stats)) => self.rag_stats = Some(stats),
                ProjectMessage::Stats(Err(e)) => {
                    log::warn!("Knowledge base stats failed: {e}");
                    self.error = Some(e.to_string());
                }
                ProjectMessage::Finished => self.request.finish(),
            }
        }
    }

    /// A failed fetch leaves the previous snapshot and logs untouched.
    fn apply_snapshot(&mut self, result: Snapshot) {
        match result {
            Ok((project, logs)) => {
                self.project = Some(project);
                self.logs = logs;
                self.clamp_selection();
            }
            Err(e) => {
                log::warn!("Project {} request failed: {e}", self.project_id);
                self.error = Some(e.to_string());
            }
        }
    }

    /// Generated chapters followed by the next chapter to write.
    pub fn chapter_entries(&self) -> Vec<ChapterEntry> {
        let Some(ref project) = self.project else {
            return Vec::new();
        };
        let mut entries: Vec<ChapterEntry> = chapter_numbers(project)
            .into_iter()
            .map(ChapterEntry::Written)
            .collect();
        entries.push(ChapterEntry::Next(next_unwritten_chapter(project)));
        entries
    }

    fn clamp_selection(&mut self) {
        let count = self.chapter_entries().len();
        self.selected = self.selected.min(count.saturating_sub(1));
    }

    // ── Input ────────────────────────────────────────────────────────────

    pub fn handle_input(&mut self, event: &Event, services: &Services) -> Option<ProjectOutcome> {
        let Event::Key(key) = event else {
            return None;
        };
        if key.kind != KeyEventKind::Press {
            return None;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('o')) => {
                self.start_outline(services);
                Some(ProjectOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('c')) => {
                self.start_characters(services);
                Some(ProjectOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                match self.tab {
                    ProjectTab::Overview => {
                        self.open_knowledge_base(services);
                    }
                    ProjectTab::KnowledgeBase => self.open_overview(),
                }
                Some(ProjectOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => {
                match self.tab {
                    ProjectTab::Overview => {
                        self.load(services);
                    }
                    ProjectTab::KnowledgeBase => {
                        self.refresh_stats(services);
                    }
                }
                Some(ProjectOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                let count = self.chapter_entries().len();
                if count > 0 {
                    self.selected = (self.selected + 1).min(count - 1);
                }
                Some(ProjectOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.selected = self.selected.saturating_sub(1);
                Some(ProjectOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::PageDown) => {
                self.scroll = self.scroll.saturating_add(10);
                Some(ProjectOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::PageUp) => {
                self.scroll = self.scroll.saturating_sub(10);
                Some(ProjectOutcome::Consumed)
            }
            (KeyModifiers::NONE, KeyCode::Enter) => {
                let entry = self.chapter_entries().get(self.selected).copied();
                Some(match entry {
                    Some(entry) => ProjectOutcome::OpenChapter(entry.number()),
                    None => ProjectOutcome::Consumed,
                })
            }
            (KeyModifiers::NONE, KeyCode::Char('n')) => Some(match self.project {
                Some(ref project) => ProjectOutcome::OpenChapter(next_unwritten_chapter(project)),
                None => ProjectOutcome::Consumed,
            }),
            _ => None,
        }
    }

    // ── Rendering ────────────────────────────────────────────────────────

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(ref project) = self.project else {
            self.render_loading(frame, area);
            return;
        };

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Length(1), Constraint::Min(0)])
            .split(area);
        self.render_header(frame, rows[0], project);
        self.render_tabs(frame, rows[1]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[2]);

        match self.tab {
            ProjectTab::Overview => self.render_overview(frame, columns[0], project),
            ProjectTab::KnowledgeBase => self.render_knowledge_base(frame, columns[0]),
        }

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(columns[1]);
        self.render_chapters(frame, side[0]);
        agent_logs::render(frame, side[1], &self.logs, false, 0);
    }

    fn render_loading(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_default(" Project ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled("  Loading...", theme::muted())),
        ];
        if let Some(ref error) = self.error {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(format!("  {error}"), theme::error())));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, project: &ProjectState) {
        let block = theme::block_default(" Project ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let pending = self.request.pending();
        let button = |action: ProjectAction, key: &'static str, idle: &'static str| {
            if pending == Some(action) {
                Span::styled(format!(" {}... ", action.label()), theme::highlight())
            } else if pending.is_some() {
                Span::styled(format!(" [{key}] {idle} "), theme::dim())
            } else {
                Span::styled(format!(" [{key}] {idle} "), theme::key_hint())
            }
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled(project.id.clone(), theme::title()),
                Span::styled(
                    format!(
                        "  {} · {} · target {} chapters",
                        project.genre, project.style, project.target_chapters
                    ),
                    theme::muted(),
                ),
            ]),
            Line::from(vec![
                button(ProjectAction::Outline, "o", "Outline"),
                button(ProjectAction::Characters, "c", "Characters"),
            ]),
        ];
        if let Some(ref error) = self.error {
            lines.push(Line::from(Span::styled(error.clone(), theme::error())));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw(" ")];
        for tab in [ProjectTab::Overview, ProjectTab::KnowledgeBase] {
            let style = if tab == self.tab {
                theme::highlight().add_modifier(Modifier::UNDERLINED)
            } else {
                theme::muted()
            };
            spans.push(Span::styled(format!(" {} ", tab.label()), style));
        }
        spans.push(Span::styled("  Tab:switch  r:refresh", theme::dim()));
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_overview(&self, frame: &mut Frame, area: Rect, project: &ProjectState) {
        let block = theme::block_focused(" Overview ");
        frame.render_widget(
            Paragraph::new(overview_lines(project))
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0)),
            area,
        );
    }

    fn render_knowledge_base(&self, frame: &mut Frame, area: Rect) {
        let block = theme::block_focused(" Knowledge base ");
        let lines = if self.rag_stats.is_none() && self.request.is_pending(ProjectAction::RagStats) {
            vec![Line::from(Span::styled("  Loading stats...", theme::muted()))]
        } else {
            stats_lines(self.rag_stats.as_ref())
        };
        frame.render_widget(
            Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: false })
                .scroll((self.scroll, 0)),
            area,
        );
    }

    fn render_chapters(&self, frame: &mut Frame, area: Rect) {
        let entries = self.chapter_entries();
        let mut lines = Vec::new();
        if entries.len() == 1 {
            lines.push(Line::from(Span::styled(
                "  No chapters yet. Expand any chapter to begin.",
                theme::muted(),
            )));
        }
        for (i, entry) in entries.iter().enumerate() {
            let selected = i == self.selected;
            let marker = if selected { "▸ " } else { "  " };
            let (text, style) = match entry {
                ChapterEntry::Written(n) => (format!("Chapter {n} (written)"), Style::default().fg(theme::TEXT)),
                ChapterEntry::Next(n) => (format!("Expand chapter {n} →"), Style::default().fg(theme::ACCENT)),
            };
            let style = if selected { style.add_modifier(Modifier::BOLD) } else { style };
            lines.push(Line::from(vec![
                Span::styled(marker, theme::highlight()),
                Span::styled(text, style),
            ]));
        }
        frame.render_widget(
            Paragraph::new(lines).block(theme::block_default(" Chapters ")),
            area,
        );
    }
}

// ── Line builders ────────────────────────────────────────────────────────────

fn overview_lines(project: &ProjectState) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled("Outline", theme::heading()))];
    if project.outline.is_empty() {
        lines.push(Line::from(Span::styled("  (empty)", theme::muted())));
    } else {
        lines.extend(project.outline.lines().map(|l| Line::raw(l.to_string())));
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled("Characters (JSON)", theme::heading())));
    let json = serde_json::to_string_pretty(&serde_json::Value::Object(project.characters.clone()))
        .unwrap_or_default();
    lines.extend(
        json.lines()
            .map(|l| Line::from(Span::styled(l.to_string(), theme::dim()))),
    );

    if !project.characters_text.is_empty() {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled("Character summary", theme::heading())));
        lines.extend(project.characters_text.lines().map(|l| Line::raw(l.to_string())));
    }
    lines
}

fn stats_lines(stats: Option<&RagStats>) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled("Indexed chunks", theme::heading()))];
    match stats {
        Some(stats) if !stats.is_empty() => {
            for (name, item) in stats {
                let updated = match item.last_updated_at {
                    Some(serde_json::Value::String(ref s)) => format_timestamp(s),
                    Some(serde_json::Value::Null) | None => "-".to_string(),
                    Some(ref other) => other.to_string(),
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("  {name:<20}"), Style::default().fg(theme::TEXT)),
                    Span::styled(format!("{:>6} chunks", item.chunks), theme::highlight()),
                    Span::styled(format!("  updated {updated}"), theme::dim()),
                ]));
            }
        }
        _ => lines.push(Line::from(Span::styled("  (empty)", theme::muted()))),
    }
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "  Every generation and expansion is indexed automatically; expansion retrieves before writing.",
        theme::dim(),
    )));
    lines
}
