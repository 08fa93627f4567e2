use crate::error::ExportError;
use crate::model::Student;
use crate::session::Session;
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::Path;

const RULE: &str = "===================================";
const THIN_RULE: &str = "-----------------------------------";

/// Plain-text listing of every group and its members, then the students
/// without a group.
pub fn render_text(session: &Session, generated: DateTime<Local>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "            CLASS MAP");
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Generated: {}", generated.format("%d/%m/%Y %H:%M:%S"));
    let _ = writeln!(out, "Total students: {}", session.students().len());
    let _ = writeln!(out, "Total groups: {}", session.groups().len());

    let mut groups: Vec<_> = session.groups().iter().collect();
    groups.sort_by_key(|g| g.id);
    if !groups.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "GROUPS");
        let _ = writeln!(out, "{THIN_RULE}");
        for group in groups {
            let members = sorted_names(group.members.iter().filter_map(|id| session.student(*id)));
            let _ = writeln!(out);
            let _ = writeln!(out, "{}", group.label().to_uppercase());
            let _ = writeln!(out, "  Students: {}", members.len());
            for name in members {
                let _ = writeln!(out, "   * {name}");
            }
        }
    }

    let ungrouped = sorted_names(session.ungrouped());
    if !ungrouped.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "UNGROUPED");
        let _ = writeln!(out, "{THIN_RULE}");
        for name in ungrouped {
            let _ = writeln!(out, "   * {name}");
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "      Generated with classmap");
    let _ = writeln!(out, "{RULE}");
    out
}

pub(crate) fn sorted_names<'a>(students: impl Iterator<Item = &'a Student>) -> Vec<&'a str> {
    let mut names: Vec<&str> = students.map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    names
}

pub fn write_text(session: &Session, path: &Path) -> Result<(), ExportError> {
    std::fs::write(path, render_text(session, Local::now()))?;
    Ok(())
}
