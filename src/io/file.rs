use std::path::Path;

use tracing::{info, warn};

use crate::model::Project;
use crate::Result;

/// Save a project to a JSON file.
pub fn save_project(project: &Project, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(project)?;
    std::fs::write(path, json)?;
    info!("saved '{}' to {}", project.name, path.display());
    Ok(())
}

/// Load a project from a JSON file.
///
/// Edges pointing at unknown tasks are dropped; repeated task ids are
/// reported but kept (lookups resolve to the first occurrence).
pub fn load_project(path: &Path) -> Result<Project> {
    let json = std::fs::read_to_string(path)?;
    let mut project: Project = serde_json::from_str(&json)?;

    let before = project.dependencies.len();
    project.prune_dependencies();
    if project.dependencies.len() < before {
        warn!(
            "dropped {} dependencies with missing endpoints",
            before - project.dependencies.len()
        );
    }
    let dupes = project.tasks.duplicate_ids();
    if !dupes.is_empty() {
        warn!("plan contains {} duplicated task ids: {:?}", dupes.len(), dupes);
    }

    info!("loaded '{}' from {}", project.name, path.display());
    Ok(project)
}
