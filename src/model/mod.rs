pub mod date;
pub mod dependency;
pub mod project;
pub mod task;
pub mod timeline;

pub use dependency::{Dependency, DependencyKind};
pub use project::Project;
pub use task::{apply_change, find_by_id, flatten, FlatTask, Forest, Task, TaskPatch, TaskStatus};
pub use timeline::{TimelineWindow, WindowMargins, ZoomLevel};
