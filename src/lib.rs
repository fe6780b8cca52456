/// novel-desk - terminal front-end for a multi-agent novel-writing backend
///
/// Typed HTTP client for the writing service plus the project, chapter, and
/// retrieval-diagnostics views built on it.

pub mod config;
pub mod core;
pub mod tui;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
