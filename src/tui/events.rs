/// Events flowing through the Elm-architecture event loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Raw terminal input (keyboard/mouse).
    Input(crossterm::event::Event),
    /// Notification pushed by a spawned request task.
    Notification(Notification),
}

/// High-level actions dispatched by the input mapper or by views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Navigation
    OpenCreate,
    OpenProject(String),
    OpenChapter(u32),
    Back,

    // Modals
    ShowHelp,
    CloseHelp,

    // Application
    Quit,
}

/// Which view is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Create,
    Project,
    Chapter,
}

impl Route {
    pub fn label(self) -> &'static str {
        match self {
            Route::Create => "New project",
            Route::Project => "Project",
            Route::Chapter => "Chapter",
        }
    }

    /// Where `Back` leads from this route.
    pub fn parent(self) -> Option<Route> {
        match self {
            Route::Create => None,
            Route::Project => Some(Route::Create),
            Route::Chapter => Some(Route::Project),
        }
    }
}

/// Notification level for the overlay system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

/// A timed notification shown in the overlay.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub level: NotificationLevel,
    /// Ticks remaining before auto-dismiss.
    pub ttl_ticks: u32,
}

impl Notification {
    /// Notification with an unassigned id and the default lifetime.
    pub fn new(message: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            id: 0,
            message: message.into(),
            level,
            ttl_ticks: 100,
        }
    }
}
