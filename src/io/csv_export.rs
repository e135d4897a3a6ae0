use std::path::Path;

use tracing::info;

use crate::model::{date::format_date, Forest, Task};
use crate::Result;

fn write_rows<W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    tasks: &Forest,
    parent: Option<&Task>,
) -> Result<usize> {
    let mut written = 0;
    for task in tasks.iter() {
        let start = format_date(task.start);
        let end = format_date(task.end);
        wtr.write_record([
            task.name.as_str(),
            start.as_str(),
            end.as_str(),
            task.status.label(),
            task.assignee.as_deref().unwrap_or(""),
            parent.map(|p| p.name.as_str()).unwrap_or(""),
        ])?;
        written += 1 + write_rows(wtr, &task.children, Some(task.as_ref()))?;
    }
    Ok(written)
}

/// Write tasks as semicolon-delimited CSV in the layout `import_csv` reads.
///
/// Rows are emitted parent-first; nesting is kept through the `Parent`
/// column. Returns the number of rows written.
pub fn export_csv_to<W: std::io::Write>(tasks: &Forest, writer: W) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(writer);
    wtr.write_record(["Task", "Start Date", "End Date", "Status", "Assignee", "Parent"])?;
    let written = write_rows(&mut wtr, tasks, None)?;
    wtr.flush()?;
    Ok(written)
}

pub fn export_csv(tasks: &Forest, path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    let written = export_csv_to(tasks, file)?;
    info!("exported {} tasks to {}", written, path.display());
    Ok(written)
}
