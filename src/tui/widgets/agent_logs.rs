//! Agent activity log panel, most recent first.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::core::api::AgentLog;
use crate::core::derive::{format_timestamp, newest_first};
use crate::tui::theme;

pub const NO_LOGS_MARKER: &str = "No agent logs yet";

/// Output previews are cut after this many lines.
const PREVIEW_MAX_LINES: usize = 8;

pub fn agent_log_lines(logs: &[AgentLog]) -> Vec<Line<'static>> {
    if logs.is_empty() {
        return vec![Line::from(Span::styled(
            format!("  {NO_LOGS_MARKER}"),
            theme::muted(),
        ))];
    }

    let mut lines = Vec::new();
    for log in newest_first(logs) {
        let mut header = vec![
            Span::styled(
                log.agent.clone(),
                Style::default()
                    .fg(theme::PRIMARY_LIGHT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(log.action.clone(), theme::muted()),
        ];
        if let Some(ts) = log.ts.as_deref() {
            header.push(Span::raw("  "));
            header.push(Span::styled(format_timestamp(ts), theme::dim()));
        }
        lines.push(Line::from(header));

        if !log.summary.is_empty() {
            lines.push(Line::raw(format!("  {}", log.summary)));
        }

        if let Some(preview) = log.output_preview.as_deref().filter(|p| !p.is_empty()) {
            let total = preview.lines().count();
            for text in preview.lines().take(PREVIEW_MAX_LINES) {
                lines.push(Line::from(Span::styled(format!("  │ {text}"), theme::dim())));
            }
            if total > PREVIEW_MAX_LINES {
                lines.push(Line::from(Span::styled(
                    format!("  │ … {} more lines", total - PREVIEW_MAX_LINES),
                    theme::dim(),
                )));
            }
        }
        lines.push(Line::raw(""));
    }
    lines
}

pub fn render(frame: &mut Frame, area: Rect, logs: &[AgentLog], focused: bool, scroll: u16) {
    let title = format!("Agent Logs ({})", logs.len());
    let block = if focused {
        theme::block_focused(&title)
    } else {
        theme::block_default(&title)
    };
    frame.render_widget(
        Paragraph::new(agent_log_lines(logs))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((scroll, 0)),
        area,
    );
}
