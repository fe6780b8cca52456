pub mod api;
pub mod derive;
pub mod logging;
