//! Critic consistency panel.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::core::api::CriticIssue;
use crate::tui::theme;

pub const NO_ISSUES_MARKER: &str = "No issues (or critic disabled)";
pub const REVISED_MARKER: &str = "Auto-revised (AUTO_REVISE)";

/// Issue list followed by the revision marker when `revised` is set.
pub fn critic_lines(issues: &[CriticIssue], revised: bool) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled("Consistency review", theme::heading()))];

    if issues.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  {NO_ISSUES_MARKER}"),
            theme::muted(),
        )));
    }

    for issue in issues {
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(
                issue.issue_type.clone(),
                Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled(
                issue.severity.clone(),
                Style::default().fg(theme::severity_color(&issue.severity)),
            ),
        ]));
        lines.push(Line::raw(format!("    {}", issue.conflict)));
        if let Some(evidence) = issue.evidence_snippet.as_deref().filter(|e| !e.is_empty()) {
            for text in evidence.lines() {
                lines.push(Line::from(Span::styled(format!("    │ {text}"), theme::dim())));
            }
        }
    }

    if revised {
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled(
            format!("  ✎ {REVISED_MARKER}"),
            Style::default()
                .fg(theme::ACCENT)
                .add_modifier(Modifier::BOLD),
        )));
    }
    lines
}
