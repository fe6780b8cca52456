//! Single-line text input with cursor management.
//!
//! Used by the project form and the chapter expansion parameters. A numeric
//! buffer accepts ASCII digits only.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    style::Style,
    text::{Line, Span},
};

use crate::tui::theme;

pub struct InputBuffer {
    content: String,
    cursor: usize,
    numeric: bool,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            numeric: false,
        }
    }

    /// Digits-only buffer.
    pub fn numeric() -> Self {
        Self {
            numeric: true,
            ..Self::new()
        }
    }

    /// Buffer seeded with `text`, cursor at the end.
    pub fn with_text(mut self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn set_text(&mut self, text: &str) {
        self.content = if self.numeric {
            text.chars().filter(char::is_ascii_digit).collect()
        } else {
            text.to_string()
        };
        self.cursor = self.content.len();
    }

    pub fn insert_char(&mut self, c: char) {
        if self.numeric && !c.is_ascii_digit() {
            return;
        }
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.content[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.content.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.content.len() {
            let next = self.next_boundary();
            self.content.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.content[..self.cursor]
                .char_indices()
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.content.len() {
            self.cursor = self.next_boundary();
        }
    }

    fn next_boundary(&self) -> usize {
        self.content[self.cursor..]
            .char_indices()
            .nth(1)
            .map(|(i, _)| self.cursor + i)
            .unwrap_or(self.content.len())
    }

    /// Apply an editing key. Returns true if the key edited or moved the
    /// cursor; navigation and submit keys are left to the caller.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) || key.modifiers.contains(KeyModifiers::ALT) {
            return false;
        }
        match key.code {
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.content.len(),
            _ => return false,
        }
        true
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    /// Parsed value of a numeric buffer. Digit strings too large for a
    /// `u32` saturate so callers clamp them to their maximum.
    pub fn value_u32(&self) -> Option<u32> {
        let digits = self.content.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(digits.parse().unwrap_or(u32::MAX))
    }

    /// Display line; draws a block cursor when `editing`.
    pub fn render_line(&self, editing: bool, placeholder: &str) -> Line<'static> {
        if self.content.is_empty() && !editing {
            return Line::from(Span::styled(placeholder.to_string(), theme::dim()));
        }
        if !editing {
            return Line::raw(self.content.clone());
        }

        let before = &self.content[..self.cursor];
        let after = &self.content[self.cursor..];
        let mut chars = after.chars();
        let cursor_char = chars.next().map(String::from).unwrap_or_else(|| " ".to_string());
        let rest: String = chars.collect();

        Line::from(vec![
            Span::raw(before.to_string()),
            Span::styled(
                cursor_char,
                Style::default().bg(theme::TEXT).fg(theme::BG_BASE),
            ),
            Span::raw(rest),
        ])
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
