//! Rendering-independent core of the Gantt chart: row geometry,
//! dependency connectors, and the drag controller.

pub mod connectors;
pub mod interaction;
pub mod layout;

pub use connectors::{Connector, ConnectorSet};
pub use interaction::{Constraints, DragMode, DragOutcome, DragState, Interaction, Violation};
pub use layout::{ChartLayout, DayColumn, Markers, RowInfo, ROW_HEIGHT};
