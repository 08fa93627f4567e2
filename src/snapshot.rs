use crate::error::SnapshotError;
use crate::model::{Group, GroupId, Point, Rect, Rgba, palette_color, student_index};
use crate::session::Session;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const FORMAT_VERSION: &str = "1.0";
pub const FILE_EXTENSION: &str = "classmap";

/// Image-free record of positions and group membership, keyed by student
/// name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub students: Vec<StudentRecord>,
    #[serde(default)]
    pub groups: Vec<GroupRecord>,
    #[serde(default)]
    pub saved_date: Option<DateTime<Local>>,
    #[serde(default = "default_version")]
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub name: String,
    pub position: Point,
    #[serde(default, with = "group_id_field")]
    pub group_id: Option<GroupId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRecord {
    pub id: GroupId,
    #[serde(default)]
    pub student_names: Vec<String>,
    #[serde(default)]
    pub color: Option<Rgba>,
    #[serde(default)]
    pub bounds: Rect,
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

/// Ungrouped is written as -1; any negative id reads back as ungrouped.
mod group_id_field {
    use crate::model::GroupId;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &Option<GroupId>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(id.map(|g| i64::from(g.0)).unwrap_or(-1))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<GroupId>, D::Error> {
        let raw = Option::<i64>::deserialize(d)?;
        Ok(raw
            .filter(|v| *v >= 0)
            .and_then(|v| u32::try_from(v).ok())
            .map(GroupId))
    }
}

impl Snapshot {
    pub fn capture(session: &Session) -> Self {
        let name_of = |id| session.student(id).map(|s| s.name.clone());
        Self {
            students: session
                .students()
                .iter()
                .map(|s| StudentRecord {
                    name: s.name.clone(),
                    position: s.position,
                    group_id: s.group_id,
                })
                .collect(),
            groups: session
                .groups()
                .iter()
                .map(|g| GroupRecord {
                    id: g.id,
                    student_names: g.members.iter().filter_map(|id| name_of(*id)).collect(),
                    color: Some(g.color),
                    bounds: g.bounds,
                })
                .collect(),
            saved_date: Some(Local::now()),
            version: FORMAT_VERSION.to_string(),
        }
    }

    pub fn from_json(s: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(s).map_err(|e| SnapshotError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Serialize(e.to_string()))
    }

    /// Overwrites positions and memberships of the live students whose names
    /// appear in the snapshot and rebuilds the group list. Names that are not
    /// on the map are ignored.
    pub(crate) fn apply(&self, session: &mut Session) {
        for student in &mut session.students {
            student.group_id = None;
        }
        for record in &self.students {
            if let Some(student) = session.students.iter_mut().find(|s| s.name == record.name) {
                student.position = record.position;
                student.group_id = record.group_id;
            }
        }

        session.groups.clear();
        for record in &self.groups {
            let mut group = Group {
                id: record.id,
                color: record.color.unwrap_or_else(|| palette_color(record.id)),
                bounds: record.bounds,
                members: Vec::new(),
            };
            for name in &record.student_names {
                let Some(student) = session.students.iter_mut().find(|s| &s.name == name) else {
                    continue;
                };
                student.group_id = Some(record.id);
                if !group.members.contains(&student.id) {
                    group.members.push(student.id);
                }
            }
            session.groups.push(group);
        }

        // A name listed under two groups belongs to the last one.
        let students = &session.students;
        for group in &mut session.groups {
            let gid = group.id;
            group.members.retain(|id| {
                student_index(students, *id)
                    .map(|i| students[i].group_id == Some(gid))
                    .unwrap_or(false)
            });
        }
        session.groups.retain(|g| {
            if g.members.is_empty() {
                log::warn!("dropping {}: none of its students are loaded", g.label());
            }
            !g.members.is_empty()
        });

        // Membership comes from the group records; a student whose group
        // does not list them is ungrouped.
        let groups = &session.groups;
        for student in &mut session.students {
            if let Some(gid) = student.group_id {
                let listed = groups
                    .iter()
                    .any(|g| g.id == gid && g.members.contains(&student.id));
                if !listed {
                    student.group_id = None;
                }
            }
        }
    }

    pub fn summary(&self, file_name: &str) -> SnapshotSummary {
        SnapshotSummary {
            file_name: file_name.to_string(),
            saved: self
                .saved_date
                .map(|d| d.format("%d/%m/%Y %H:%M").to_string()),
            students: self.students.len(),
            groups: self.groups.len(),
            version: self.version.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub file_name: String,
    pub saved: Option<String>,
    pub students: usize,
    pub groups: usize,
    pub version: String,
}

impl fmt::Display for SnapshotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File: {}", self.file_name)?;
        writeln!(f, "Saved: {}", self.saved.as_deref().unwrap_or("unknown"))?;
        writeln!(f, "Students: {}", self.students)?;
        writeln!(f, "Groups: {}", self.groups)?;
        write!(f, "Version: {}", self.version)
    }
}

pub fn save(snapshot: &Snapshot, path: &Path) -> Result<(), SnapshotError> {
    let json = snapshot.to_json()?;
    std::fs::write(path, json)?;
    log::info!(
        "saved {} students and {} groups to {}",
        snapshot.students.len(),
        snapshot.groups.len(),
        path.display()
    );
    Ok(())
}

pub fn load(path: &Path) -> Result<Snapshot, SnapshotError> {
    let s = std::fs::read_to_string(path)?;
    Snapshot::from_json(&s)
}

pub fn read_summary(path: &Path) -> Result<SnapshotSummary, SnapshotError> {
    let snapshot = load(path)?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(snapshot.summary(&file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ArrangementStyle, LayoutParams};
    use crate::model::Canvas;

    fn class(names: &[&str]) -> Session {
        let mut session = Session::new(Canvas::new(1200, 800));
        for (i, name) in names.iter().enumerate() {
            session.add_student(*name, None, Point::new(10 * i as i32, 90));
        }
        session
    }

    #[test]
    fn json_uses_camel_case_and_minus_one() {
        let session = class(&["Ana"]);
        let json = Snapshot::capture(&session).to_json().unwrap();
        assert!(json.contains("\"savedDate\""));
        assert!(json.contains("\"groupId\": -1"));
        assert!(json.contains("\"version\": \"1.0\""));
    }

    #[test]
    fn capture_then_apply_is_identity() {
        let mut session = class(&["A", "B", "C", "D", "E"]);
        session.organize(ArrangementStyle::Groups, LayoutParams::new(4, 2));
        let groups_before = session.groups().to_vec();
        let before: Vec<_> = session
            .students()
            .iter()
            .map(|s| (s.position, s.group_id))
            .collect();

        let snapshot = Snapshot::from_json(&Snapshot::capture(&session).to_json().unwrap()).unwrap();
        session.organize(ArrangementStyle::Circle, LayoutParams::default());
        session.apply_snapshot(&snapshot);

        let after: Vec<_> = session
            .students()
            .iter()
            .map(|s| (s.position, s.group_id))
            .collect();
        assert_eq!(before, after);
        assert_eq!(session.groups(), groups_before.as_slice());
    }

    #[test]
    fn unknown_names_and_empty_groups_are_dropped() {
        let json = r#"{
            "students": [
                {"name": "Ana", "position": {"x": 300, "y": 400}, "groupId": 1},
                {"name": "Zoe", "position": {"x": 5, "y": 5}, "groupId": 0}
            ],
            "groups": [
                {"id": 0, "studentNames": ["Zoe"], "bounds": {"x": 0, "y": 0, "width": 10, "height": 10}},
                {"id": 1, "studentNames": ["Ana", "Ghost"], "bounds": {"x": 1, "y": 2, "width": 3, "height": 4}}
            ],
            "version": "1.0"
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        let mut session = class(&["Ana", "Bo"]);
        session.apply_snapshot(&snapshot);

        assert_eq!(session.groups().len(), 1);
        let group = &session.groups()[0];
        assert_eq!(group.id, GroupId(1));
        assert_eq!(group.color, palette_color(GroupId(1)));
        assert_eq!(group.bounds, Rect::new(1, 2, 3, 4));
        let ana = session.student_by_name("Ana").unwrap();
        assert_eq!(ana.position, Point::new(300, 400));
        assert_eq!(ana.group_id, Some(GroupId(1)));
        assert_eq!(session.student_by_name("Bo").unwrap().group_id, None);
    }

    #[test]
    fn dangling_group_ids_become_ungrouped() {
        let json = r#"{
            "students": [{"name": "Ana", "position": {"x": 1, "y": 2}, "groupId": 7}],
            "groups": []
        }"#;
        let mut session = class(&["Ana"]);
        session.apply_snapshot(&Snapshot::from_json(json).unwrap());
        assert_eq!(session.students()[0].group_id, None);
        assert_eq!(session.students()[0].position, Point::new(1, 2));
    }

    #[test]
    fn group_id_without_listing_becomes_ungrouped() {
        let json = r#"{
            "students": [
                {"name": "Ana", "position": {"x": 1, "y": 2}, "groupId": 0},
                {"name": "Bo", "position": {"x": 3, "y": 4}, "groupId": 0}
            ],
            "groups": [{"id": 0, "studentNames": ["Bo"]}]
        }"#;
        let mut session = class(&["Ana", "Bo"]);
        session.apply_snapshot(&Snapshot::from_json(json).unwrap());
        assert_eq!(session.student_by_name("Ana").unwrap().group_id, None);
        assert_eq!(session.student_by_name("Bo").unwrap().group_id, Some(GroupId(0)));
        assert_eq!(session.ungrouped().count(), 1);
        assert_eq!(session.groups()[0].members.len(), 1);
    }

    #[test]
    fn negative_or_missing_group_id_reads_as_ungrouped() {
        let json = r#"{"students": [
            {"name": "A", "position": {"x": 0, "y": 0}, "groupId": -3},
            {"name": "B", "position": {"x": 0, "y": 0}}
        ]}"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        assert!(snapshot.students.iter().all(|s| s.group_id.is_none()));
        assert_eq!(snapshot.version, "1.0");
    }

    #[test]
    fn bad_json_leaves_session_untouched() {
        let mut session = class(&["Ana"]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.classmap");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            session.load_snapshot(&path),
            Err(SnapshotError::Parse(_))
        ));
        assert_eq!(session.students()[0].position, Point::new(0, 90));
        assert!(!session.can_undo());
        assert!(matches!(
            session.load_snapshot(&dir.path().join("missing.classmap")),
            Err(SnapshotError::Io(_))
        ));
    }

    #[test]
    fn summary_lists_counts() {
        let mut session = class(&["A", "B", "C"]);
        session.organize(ArrangementStyle::Groups, LayoutParams::new(4, 2));
        let summary = Snapshot::capture(&session).summary("class.classmap");
        assert_eq!(summary.students, 3);
        assert_eq!(summary.groups, 2);
        let text = summary.to_string();
        assert!(text.starts_with("File: class.classmap\n"));
        assert!(text.ends_with("Version: 1.0"));
    }
}
