pub mod analytics;
pub mod app;
pub mod clock;
pub mod effects;
pub mod error;
pub mod history;
pub mod radio;
pub mod store;
pub mod theme;
pub mod timer;
pub mod ui;

pub use error::{Error, Result};
