//! Color theme for the Novel Desk TUI.
//!
//! All color constants are RGB truecolor. Views import from here
//! instead of using inline `Color::*` literals.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders};

// ── Primary palette ─────────────────────────────────────────────────────────

/// Teal. Primary accent, active items and focused borders.
pub const PRIMARY: Color = Color::Rgb(0x00, 0x80, 0x80);
/// Light teal for highlights and hints.
pub const PRIMARY_LIGHT: Color = Color::Rgb(0x00, 0x96, 0x88);

// ── Accent ──────────────────────────────────────────────────────────────────

/// Coral. Calls to action and the auto-revision marker.
pub const ACCENT: Color = Color::Rgb(0xFF, 0x7F, 0x50);

// ── Backgrounds ─────────────────────────────────────────────────────────────

pub const BG_BASE: Color = Color::Rgb(0x0A, 0x19, 0x19);

// ── Text ────────────────────────────────────────────────────────────────────

pub const TEXT: Color = Color::Rgb(0xE0, 0xE0, 0xE0);
pub const TEXT_MUTED: Color = Color::Rgb(0x80, 0x80, 0x80);
pub const TEXT_DIM: Color = Color::Rgb(0x50, 0x50, 0x50);

// ── Semantic ────────────────────────────────────────────────────────────────

pub const ERROR: Color = Color::Rgb(0xEF, 0x53, 0x50);
pub const SUCCESS: Color = Color::Rgb(0x66, 0xBB, 0x6A);
pub const WARNING: Color = Color::Rgb(0xFF, 0xA7, 0x26);
pub const INFO: Color = Color::Rgb(0x42, 0xA5, 0xF5);

// ── Retrieval channels ──────────────────────────────────────────────────────

/// Vector similarity recall (lavender).
pub const CHANNEL_VECTOR: Color = Color::Rgb(0xCE, 0x93, 0xD8);
/// Keyword recall (amber).
pub const CHANNEL_KEYWORD: Color = Color::Rgb(0xFF, 0xD5, 0x4F);

/// Color for a recall channel label; merge/selection stages share the
/// primary color.
pub fn channel_color(channel: &str) -> Color {
    match channel {
        "vector" => CHANNEL_VECTOR,
        "keyword" => CHANNEL_KEYWORD,
        _ => PRIMARY_LIGHT,
    }
}

/// Color for a critic severity label. Unknown severities render as info.
pub fn severity_color(severity: &str) -> Color {
    match severity.to_ascii_lowercase().as_str() {
        "high" | "critical" | "error" => ERROR,
        "medium" | "warning" | "warn" => WARNING,
        "low" | "minor" => SUCCESS,
        _ => INFO,
    }
}

// ── Style helpers ───────────────────────────────────────────────────────────

/// Accent bold text (titles, active items).
pub fn title() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

/// Section header style.
pub fn heading() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(PRIMARY)
}

pub fn border_default() -> Style {
    Style::default().fg(TEXT_DIM)
}

/// Highlighted/selected item.
pub fn highlight() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn muted() -> Style {
    Style::default().fg(TEXT_MUTED)
}

pub fn dim() -> Style {
    Style::default().fg(TEXT_DIM)
}

/// Key hint style (e.g., "[q]:quit").
pub fn key_hint() -> Style {
    Style::default().fg(TEXT_DIM)
}

pub fn error() -> Style {
    Style::default().fg(ERROR)
}

/// Status bar brand badge.
pub fn brand_badge() -> Style {
    Style::default()
        .fg(BG_BASE)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

/// Text-entry mode badge.
pub fn edit_badge() -> Style {
    Style::default()
        .fg(BG_BASE)
        .bg(PRIMARY_LIGHT)
        .add_modifier(Modifier::BOLD)
}

// ── Block builders ──────────────────────────────────────────────────────────

/// A bordered block with focused styling.
pub fn block_focused(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border_focused())
}

/// A bordered block with default (unfocused) styling.
pub fn block_default(title: &str) -> Block<'_> {
    Block::default()
        .title(format!(" {title} "))
        .borders(Borders::ALL)
        .border_style(border_default())
}
