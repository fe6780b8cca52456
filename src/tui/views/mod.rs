pub mod chapter;
pub mod create;
pub mod project;
