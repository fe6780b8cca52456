pub mod agent_logs;
pub mod chunk_list;
pub mod critic;
pub mod input_buffer;

#[cfg(test)]
use ratatui::text::Line;

/// Flatten rendered lines to plain text, one line per row.
#[cfg(test)]
pub(crate) fn plain_text(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
