use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::model::{date, Forest, Task, TaskStatus};
use crate::{Error, Result};

/// Try the ISO form first, then a few common regional formats.
fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Some(d) = date::parse_date(s) {
        return Some(d);
    }
    let s = s.trim();
    for fmt in &["%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// Detect delimiter by checking the first line for common separators.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons >= commas && semicolons >= tabs {
        b';'
    } else if tabs >= commas {
        b'\t'
    } else {
        b','
    }
}

fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-', '_'], "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Name,
    Start,
    End,
    Status,
    Assignee,
    Parent,
}

fn header_to_col(normalized: &str) -> Option<Column> {
    match normalized {
        "name" | "task" | "tasklabel" | "taskname" | "label" | "title" | "activity" => {
            Some(Column::Name)
        }
        "start" | "startdate" | "from" | "begin" | "begindate" => Some(Column::Start),
        "end" | "enddate" | "to" | "finish" | "finishdate" | "due" | "duedate" => {
            Some(Column::End)
        }
        "status" | "state" | "stage" => Some(Column::Status),
        "assignee" | "owner" | "resource" | "responsible" | "contractor" => Some(Column::Assignee),
        "parent" | "parenttask" | "parentname" | "subtaskof" | "phase" => Some(Column::Parent),
        _ => None,
    }
}

/// Whether linking `child` under `parent` would close a loop.
fn creates_cycle(parents: &[Option<usize>], child: usize, parent: usize) -> bool {
    let mut current = Some(parent);
    let mut steps = 0;
    while let Some(i) = current {
        if i == child || steps > parents.len() {
            return true;
        }
        current = parents[i];
        steps += 1;
    }
    false
}

fn build_tree(tasks: &[Task], parents: &[Option<usize>]) -> Forest {
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    let mut roots = Vec::new();
    for (i, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    fn build(i: usize, tasks: &[Task], children: &[Vec<usize>]) -> Task {
        let kids = children[i].iter().map(|&c| build(c, tasks, children)).collect();
        tasks[i].clone().with_children(kids)
    }

    roots.into_iter().map(|i| build(i, tasks, &children)).collect()
}

/// Import tasks from a CSV file. Returns `(tasks, skipped_rows)`.
pub fn import_csv(path: &Path) -> Result<(Forest, usize)> {
    let content = std::fs::read_to_string(path)?;
    let result = import_csv_str(&content)?;
    info!(
        "imported {} top-level tasks from {} ({} rows skipped)",
        result.0.len(),
        path.display(),
        result.1
    );
    Ok(result)
}

/// Parse CSV text. The delimiter (`;`, `,` or tab) is auto-detected and
/// headers are matched loosely ("Task Label", "Start Date", ...). A
/// `parent` column nests a row under the row with that name.
pub fn import_csv_str(content: &str) -> Result<(Forest, usize)> {
    let first_line = content.lines().next().unwrap_or("");
    let delimiter = detect_delimiter(first_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let col_map: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_col(&normalize_header(h)))
        .collect();

    let has = |c: Column| col_map.contains(&Some(c));
    if !has(Column::Name) || !has(Column::Start) || !has(Column::End) {
        return Err(Error::MissingColumns {
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    let mut tasks: Vec<Task> = Vec::new();
    let mut parent_names: Vec<Option<String>> = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in reader.records().enumerate() {
        let line = i + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("skipping CSV row {}: {}", line, e);
                skipped += 1;
                continue;
            }
        };

        let mut fields: HashMap<Column, &str> = HashMap::new();
        for (field, column) in record.iter().zip(&col_map) {
            if let Some(column) = column {
                fields.entry(*column).or_insert(field);
            }
        }
        let field = |c: Column| fields.get(&c).copied().filter(|s| !s.is_empty());

        let Some(name) = field(Column::Name) else {
            skipped += 1;
            continue;
        };
        let Some(start) = field(Column::Start).and_then(parse_date) else {
            let raw = field(Column::Start).unwrap_or("");
            warn!("skipping row {}: invalid start date '{}'", line, raw);
            skipped += 1;
            continue;
        };
        let Some(end) = field(Column::End).and_then(parse_date) else {
            warn!("skipping row {}: invalid end date '{}'", line, field(Column::End).unwrap_or(""));
            skipped += 1;
            continue;
        };

        let mut task = Task::new(name, start, end);
        task.status = field(Column::Status)
            .and_then(TaskStatus::from_label)
            .unwrap_or_default();
        task.assignee = field(Column::Assignee).map(str::to_string);

        parent_names.push(field(Column::Parent).map(str::to_string));
        tasks.push(task);
    }

    if tasks.is_empty() {
        return Err(Error::EmptyImport { skipped });
    }

    // Resolve parent names once every row is known.
    let name_to_index: HashMap<String, usize> = tasks
        .iter()
        .enumerate()
        .rev()
        .map(|(i, t)| (t.name.to_lowercase(), i))
        .collect();

    let mut parents: Vec<Option<usize>> = vec![None; tasks.len()];
    for (i, parent_name) in parent_names.iter().enumerate() {
        let Some(pname) = parent_name else { continue };
        match name_to_index.get(&pname.to_lowercase()) {
            Some(&p) if !creates_cycle(&parents, i, p) => parents[i] = Some(p),
            Some(_) => warn!(
                "ignoring parent '{}' of '{}': would form a cycle",
                pname, tasks[i].name
            ),
            None => warn!("parent task '{}' not found for '{}'", pname, tasks[i].name),
        }
    }

    Ok((build_tree(&tasks, &parents), skipped))
}
