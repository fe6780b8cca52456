//! Retrieved chunk list used by the preview and expansion panels.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::core::api::RetrievedChunkSummary;
use crate::tui::theme;

/// Shown in place of an empty list.
pub const EMPTY_MARKER: &str = "(empty)";

/// Snippets are cut after this many lines.
const SNIPPET_MAX_LINES: usize = 6;

/// Titled list of chunks. An empty list renders [`EMPTY_MARKER`] under the
/// title rather than nothing.
pub fn chunk_list_lines(title: &str, chunks: &[RetrievedChunkSummary]) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(vec![
        Span::styled(title.to_string(), theme::heading()),
        Span::styled(format!("  [{}]", chunks.len()), theme::muted()),
    ])];

    if chunks.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  {EMPTY_MARKER}"),
            theme::muted(),
        )));
        lines.push(Line::raw(""));
        return lines;
    }

    for chunk in chunks {
        lines.push(chunk_header(chunk));
        let total = chunk.snippet.lines().count();
        for text in chunk.snippet.lines().take(SNIPPET_MAX_LINES) {
            lines.push(Line::from(Span::styled(format!("    {text}"), theme::dim())));
        }
        if total > SNIPPET_MAX_LINES {
            lines.push(Line::from(Span::styled("    …", theme::dim())));
        }
    }
    lines.push(Line::raw(""));
    lines
}

fn chunk_header(chunk: &RetrievedChunkSummary) -> Line<'static> {
    let chapter = chunk
        .chapter_no
        .map(|n| format!("chapter={n}"))
        .unwrap_or_else(|| "chapter=-".to_string());
    let mut spans = vec![
        Span::raw("  "),
        Span::styled(
            chunk.kind.clone(),
            Style::default().fg(theme::TEXT).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            chunk.channel.clone(),
            Style::default().fg(theme::channel_color(&chunk.channel)),
        ),
        Span::styled(format!(" score={:.3}", chunk.score), theme::muted()),
        Span::styled(format!("  {chapter}"), theme::dim()),
    ];
    if let Some(source) = chunk.source_id.as_deref() {
        spans.push(Span::styled(format!(" source={source}"), theme::dim()));
    }
    Line::from(spans)
}
