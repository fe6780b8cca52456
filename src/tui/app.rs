use std::io;
use std::time::Duration;

use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use super::events::{Action, AppEvent, Notification, NotificationLevel, Route};
use super::layout::AppLayout;
use super::services::Services;
use super::theme;
use super::views::chapter::{ChapterOutcome, ChapterViewState};
use super::views::create::{CreateOutcome, CreateProjectState};
use super::views::project::{ProjectOutcome, ProjectViewState};

/// Visible notifications at most.
const MAX_NOTIFICATIONS: usize = 3;

/// Central application state (Elm architecture).
pub struct AppState {
    /// Whether the app is still running.
    pub running: bool,
    /// Currently displayed view.
    pub route: Route,
    /// Project creation form. Lives for the whole session.
    pub create: CreateProjectState,
    /// Detail view of the open project.
    pub project: Option<ProjectViewState>,
    /// Open chapter of the open project.
    pub chapter: Option<ChapterViewState>,
    /// Active notifications (max 3 visible).
    pub notifications: Vec<Notification>,
    /// Monotonic counter for notification IDs.
    notification_counter: u64,
    /// Whether the help modal is open.
    pub show_help: bool,
    /// Receiver for events pushed by views and spawned tasks.
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    /// Backend services handle.
    services: Services,
}

impl AppState {
    pub fn new(event_rx: mpsc::UnboundedReceiver<AppEvent>, services: Services) -> Self {
        Self {
            running: true,
            route: Route::Create,
            create: CreateProjectState::new(),
            project: None,
            chapter: None,
            notifications: Vec::new(),
            notification_counter: 0,
            show_help: false,
            event_rx,
            services,
        }
    }

    // ── Elm event loop ──────────────────────────────────────────────────

    /// Main event loop: render → select → update → loop.
    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        tick_rate: Duration,
    ) -> io::Result<()> {
        let mut tick_interval = tokio::time::interval(tick_rate);
        let mut event_stream = EventStream::new();

        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            tokio::select! {
                _ = tick_interval.tick() => {
                    self.on_tick();
                }
                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }
                Some(Ok(crossterm_event)) = event_stream.next() => {
                    self.handle_event(AppEvent::Input(crossterm_event));
                }
            }
        }

        Ok(())
    }

    // ── Event handling ──────────────────────────────────────────────────

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(crossterm_event) => {
                // Ctrl+C quits from anywhere, text entry included
                if is_force_quit(&crossterm_event) {
                    self.handle_action(Action::Quit);
                    return;
                }

                if self.show_help {
                    if let Some(action) = self.map_help_input(&crossterm_event) {
                        self.handle_action(action);
                    }
                    return;
                }

                if self.dispatch_view_input(&crossterm_event) {
                    return;
                }

                if let Some(action) = self.map_input_to_action(crossterm_event) {
                    self.handle_action(action);
                }
            }
            AppEvent::Notification(notification) => {
                self.push_notification(notification.message, notification.level);
            }
        }
    }

    /// Dispatch input to the current view. Returns true if consumed.
    fn dispatch_view_input(&mut self, event: &Event) -> bool {
        match self.route {
            Route::Create => match self.create.handle_input(event, &self.services) {
                Some(CreateOutcome::Consumed) => true,
                Some(CreateOutcome::OpenProject(id)) => {
                    self.handle_action(Action::OpenProject(id));
                    true
                }
                None => false,
            },
            Route::Project => {
                let Some(ref mut project) = self.project else {
                    return false;
                };
                match project.handle_input(event, &self.services) {
                    Some(ProjectOutcome::Consumed) => true,
                    Some(ProjectOutcome::OpenChapter(n)) => {
                        self.handle_action(Action::OpenChapter(n));
                        true
                    }
                    None => false,
                }
            }
            Route::Chapter => {
                let Some(ref mut chapter) = self.chapter else {
                    return false;
                };
                match chapter.handle_input(event, &self.services) {
                    Some(ChapterOutcome::Consumed) => true,
                    Some(ChapterOutcome::Back) => {
                        self.handle_action(Action::Back);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    // ── Input mapping ───────────────────────────────────────────────────

    fn map_help_input(&self, event: &Event) -> Option<Action> {
        let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return None;
        };
        match code {
            KeyCode::Esc | KeyCode::Char('?') => Some(Action::CloseHelp),
            _ => None,
        }
    }

    /// Global keybindings; only reached when the view did not consume the key.
    fn map_input_to_action(&self, event: Event) -> Option<Action> {
        let Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) = event
        else {
            return None;
        };

        match (modifiers, code) {
            (KeyModifiers::NONE | KeyModifiers::SHIFT, _) => match code {
                KeyCode::Char('q') => Some(Action::Quit),
                KeyCode::Char('?') => Some(Action::ShowHelp),
                KeyCode::Char('N') => Some(Action::OpenCreate),
                KeyCode::Esc => Some(Action::Back),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::ShowHelp => self.show_help = true,
            Action::CloseHelp => self.show_help = false,
            Action::OpenCreate => self.route = Route::Create,
            Action::OpenProject(id) => self.open_project(id),
            Action::OpenChapter(n) => self.open_chapter(n),
            Action::Back => match self.route.parent() {
                Some(Route::Project) => {
                    self.chapter = None;
                    self.route = Route::Project;
                    if let Some(ref mut project) = self.project {
                        project.load(&self.services);
                    }
                }
                Some(parent) => self.route = parent,
                None => {}
            },
        }
    }

    /// Show a project, reusing the view when the id is unchanged.
    pub fn open_project(&mut self, project_id: String) {
        log::info!("Opening project {project_id}");
        let reuse = self
            .project
            .as_ref()
            .is_some_and(|p| p.project_id() == project_id);
        if !reuse {
            self.project = Some(ProjectViewState::new(project_id));
        }
        if let Some(ref mut project) = self.project {
            project.load(&self.services);
        }
        self.chapter = None;
        self.route = Route::Project;
    }

    fn open_chapter(&mut self, chapter: u32) {
        let Some(ref project) = self.project else {
            return;
        };
        let mut view =
            ChapterViewState::new(project.project_id(), chapter, &self.services.generation);
        view.load(&self.services);
        self.chapter = Some(view);
        self.route = Route::Chapter;
    }

    /// Label of the request in flight on the current view.
    fn pending_label(&self) -> Option<&'static str> {
        match self.route {
            Route::Create => self.create.is_busy().then_some("Creating project"),
            Route::Project => self
                .project
                .as_ref()
                .and_then(|p| p.pending())
                .map(|a| a.label()),
            Route::Chapter => self
                .chapter
                .as_ref()
                .and_then(|c| c.pending())
                .map(|a| a.label()),
        }
    }

    // ── Notifications ───────────────────────────────────────────────────

    /// Push a notification (dedup by message, max 3).
    pub fn push_notification(&mut self, message: String, level: NotificationLevel) {
        if self.notifications.iter().any(|n| n.message == message) {
            return;
        }

        self.notification_counter += 1;
        let mut notification = Notification::new(message, level);
        notification.id = self.notification_counter;
        self.notifications.push(notification);

        while self.notifications.len() > MAX_NOTIFICATIONS {
            self.notifications.remove(0);
        }
    }

    /// Tick: decrement notification TTLs, dismiss expired, poll views.
    fn on_tick(&mut self) {
        for n in &mut self.notifications {
            n.ttl_ticks = n.ttl_ticks.saturating_sub(1);
        }
        self.notifications.retain(|n| n.ttl_ticks > 0);

        if let Some(CreateOutcome::OpenProject(id)) = self.create.poll() {
            self.push_notification(format!("Project {id} created"), NotificationLevel::Success);
            self.handle_action(Action::OpenProject(id));
        }
        if let Some(ref mut project) = self.project {
            project.poll();
        }
        if let Some(ref mut chapter) = self.chapter {
            chapter.poll();
        }
    }

    // ── Rendering ───────────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let layout = AppLayout::compute(area);

        if let Some(header) = layout.header {
            self.render_header(frame, header);
        }
        self.render_content(frame, layout.main);
        self.render_status_bar(frame, layout.status);

        self.render_notifications(frame, area);
        if self.show_help {
            self.render_help_modal(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" novel-desk ", theme::brand_badge()),
            Span::raw(" "),
        ];
        match self.route {
            Route::Create => spans.push(Span::styled(Route::Create.label(), theme::heading())),
            Route::Project | Route::Chapter => {
                if let Some(ref project) = self.project {
                    spans.push(Span::styled(
                        format!("Project {}", project.project_id()),
                        theme::heading(),
                    ));
                }
                if let (Route::Chapter, Some(chapter)) = (self.route, self.chapter.as_ref()) {
                    spans.push(Span::styled(" › ", theme::dim()));
                    spans.push(Span::styled(
                        format!("Chapter {}", chapter.chapter()),
                        theme::heading(),
                    ));
                }
            }
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_content(&self, frame: &mut Frame, area: Rect) {
        match (self.route, self.project.as_ref(), self.chapter.as_ref()) {
            (Route::Chapter, _, Some(chapter)) => chapter.render(frame, area),
            (Route::Project, Some(project), _) => project.render(frame, area),
            _ => self.create.render(frame, area),
        }
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let activity = match self.pending_label() {
            Some(label) => Span::styled(
                format!("{label}..."),
                Style::default().fg(theme::PRIMARY_LIGHT),
            ),
            None => Span::styled("ready", Style::default().fg(theme::TEXT_MUTED)),
        };

        let editing = self.route == Route::Create
            || self.chapter.as_ref().is_some_and(|c| c.is_editing());
        let mode_indicator = if editing {
            Span::styled(" EDIT ", theme::edit_badge())
        } else {
            Span::raw("")
        };

        let status = Line::from(vec![
            mode_indicator,
            Span::raw(" "),
            Span::styled(
                self.route.label(),
                Style::default()
                    .fg(theme::PRIMARY_LIGHT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" │ "),
            activity,
            Span::raw(" │ "),
            Span::styled(self.services.api.base_url().to_string(), theme::dim()),
            Span::raw(" │ "),
            Span::styled("?", theme::key_hint()),
            Span::raw(":help "),
            Span::styled("Ctrl+C", theme::key_hint()),
            Span::raw(":quit"),
        ]);

        frame.render_widget(Paragraph::new(status), area);
    }

    fn render_notifications(&self, frame: &mut Frame, area: Rect) {
        if self.notifications.is_empty() {
            return;
        }

        let max_width = 50.min(area.width.saturating_sub(2));
        let height = self.notifications.len() as u16;
        let x = area.width.saturating_sub(max_width + 1);
        let y = 1;

        let notification_area = Rect::new(x, y, max_width, height);

        let lines: Vec<Line> = self
            .notifications
            .iter()
            .map(|n| {
                let (prefix, color) = match n.level {
                    NotificationLevel::Success => ("✓", theme::SUCCESS),
                    NotificationLevel::Warning => ("⚠", theme::WARNING),
                    NotificationLevel::Error => ("✗", theme::ERROR),
                };
                Line::from(vec![
                    Span::styled(format!(" {prefix} "), Style::default().fg(color).bold()),
                    Span::raw(n.message.as_str()),
                ])
            })
            .collect();

        frame.render_widget(Clear, notification_area);
        frame.render_widget(Paragraph::new(lines), notification_area);
    }

    fn render_help_modal(&self, frame: &mut Frame, area: Rect) {
        let modal = centered_rect(60, 80, area);

        let keybindings = [
            ("Global:", ""),
            ("Ctrl+C", "Quit"),
            ("q", "Quit (outside text entry)"),
            ("?", "Toggle this help"),
            ("N", "New project"),
            ("Esc", "Back / close modal"),
            ("", ""),
            ("New project:", ""),
            ("Tab / ↑↓", "Next / previous field"),
            ("Enter / Ctrl+S", "Create project"),
            ("", ""),
            ("Project:", ""),
            ("o", "Generate or update outline"),
            ("c", "Generate or update characters"),
            ("Tab", "Overview / knowledge base"),
            ("r", "Refresh project or stats"),
            ("j/k", "Select chapter"),
            ("Enter", "Open chapter"),
            ("n", "Open next unwritten chapter"),
            ("", ""),
            ("Chapter:", ""),
            ("i / w", "Edit instruction / target words"),
            ("Esc / Enter", "Stop editing"),
            ("e", "Expand chapter"),
            ("p", "Toggle retrieval preview"),
            ("R", "Refresh preview"),
            ("Tab", "Cycle panel"),
            ("j/k", "Scroll"),
        ];

        let mut lines = vec![
            Line::raw(""),
            Line::from(Span::styled(
                " Keybindings",
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::raw(""),
        ];

        for (key, desc) in keybindings {
            if key.is_empty() {
                lines.push(Line::raw(""));
            } else if desc.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("  {key}"),
                    Style::default()
                        .fg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                )));
            } else {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(
                        format!("{key:<22}"),
                        Style::default().fg(theme::PRIMARY_LIGHT).bold(),
                    ),
                    Span::raw(desc),
                ]));
            }
        }

        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::raw("  Press "),
            Span::styled("?", Style::default().fg(theme::PRIMARY_LIGHT).bold()),
            Span::raw(" or "),
            Span::styled("Esc", Style::default().fg(theme::PRIMARY_LIGHT).bold()),
            Span::raw(" to close"),
        ]));

        let block = Block::default()
            .title(" Help ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::ACCENT));

        frame.render_widget(Clear, modal);
        frame.render_widget(Paragraph::new(lines).block(block), modal);
    }
}

fn is_force_quit(event: &Event) -> bool {
    matches!(
        event,
        Event::Key(KeyEvent {
            code: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            ..
        })
    )
}

/// Calculate a centered rect using percentage of parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(area);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}
