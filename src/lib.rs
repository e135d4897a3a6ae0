//! Interactive Gantt timeline for construction plans: a task tree and
//! finish-to-start dependencies laid out as draggable bars.

pub mod app;
pub mod chart;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod ui;

pub use error::{Error, Result};
