use crate::error::SnapshotError;
use crate::history::History;
use crate::layout::{self, ArrangementStyle, LayoutParams};
use crate::model::{Canvas, Group, GroupId, Point, Student, StudentId, group_index, student_index};
use crate::photos::{self, ImportLimits, ImportReport, LoadedPhoto};
use crate::snapshot::{self, Snapshot};
use image::RgbaImage;
use std::path::{Path, PathBuf};

const HISTORY_LIMIT: usize = 50;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OrganizeOutcome {
    NothingToArrange,
    Arranged {
        style: ArrangementStyle,
        students: usize,
        groups: usize,
    },
}

/// Positions, memberships and groups; everything undo can restore.
#[derive(Clone, Debug, PartialEq)]
struct LayoutState {
    students: Vec<(StudentId, Point, Option<GroupId>)>,
    groups: Vec<Group>,
}

/// The students and groups currently on the map.
pub struct Session {
    pub(crate) canvas: Canvas,
    pub(crate) students: Vec<Student>,
    pub(crate) groups: Vec<Group>,
    next_id: u64,
    history: History<LayoutState>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Canvas::default())
    }
}

impl Session {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            students: Vec::new(),
            groups: Vec::new(),
            next_id: 1,
            history: History::new(HISTORY_LIMIT),
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn set_canvas(&mut self, width: i32, height: i32) {
        self.canvas.width = width;
        self.canvas.height = height;
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn student(&self, id: StudentId) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn student_by_name(&self, name: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.name == name)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn ungrouped(&self) -> impl Iterator<Item = &Student> {
        self.students.iter().filter(|s| s.group_id.is_none())
    }

    /// Appends a student at `position` and returns its id.
    pub fn add_student(
        &mut self,
        name: impl Into<String>,
        photo: Option<RgbaImage>,
        position: Point,
    ) -> StudentId {
        let id = StudentId(self.next_id);
        self.next_id += 1;
        let mut student = Student::new(id, name, photo);
        student.position = position;
        self.students.push(student);
        id
    }

    /// Replaces every student with the photos in `paths`. Previous photos are
    /// released and groups and history are cleared.
    pub fn load_photos(&mut self, paths: &[PathBuf], limits: &ImportLimits) -> ImportReport {
        let (loaded, report) = photos::load_batch(paths, limits);
        self.replace_with(loaded);
        log::info!(
            "imported {} photos ({} skipped, {} over the batch limit)",
            report.loaded,
            report.skipped.len(),
            report.truncated
        );
        report
    }

    fn replace_with(&mut self, loaded: Vec<LoadedPhoto>) {
        self.reset();
        for (index, photo) in loaded.into_iter().enumerate() {
            let position = photos::initial_position(index, &self.canvas);
            self.add_student(photo.name, Some(photo.image), position);
        }
    }

    pub fn organize(&mut self, style: ArrangementStyle, params: LayoutParams) -> OrganizeOutcome {
        if self.students.is_empty() {
            return OrganizeOutcome::NothingToArrange;
        }
        self.record();
        self.ungroup_all();

        let arrangement = layout::arrange(style, &self.students, params, &self.canvas);
        for (id, position) in &arrangement.positions {
            if let Some(idx) = student_index(&self.students, *id) {
                self.students[idx].position = *position;
            }
        }
        for plan in arrangement.groups {
            for id in &plan.members {
                if let Some(idx) = student_index(&self.students, *id) {
                    self.students[idx].group_id = Some(plan.id);
                }
            }
            self.groups.push(plan.into_group());
        }

        OrganizeOutcome::Arranged {
            style,
            students: self.students.len(),
            groups: self.groups.len(),
        }
    }

    /// Empties the group list without moving anyone. Returns how many groups
    /// were removed.
    pub fn clear_groups(&mut self) -> usize {
        let removed = self.groups.len();
        if removed > 0 || self.students.iter().any(|s| s.group_id.is_some()) {
            self.record();
        }
        self.ungroup_all();
        removed
    }

    fn ungroup_all(&mut self) {
        self.groups.clear();
        for student in &mut self.students {
            student.group_id = None;
        }
    }

    pub fn reset(&mut self) {
        self.students.clear();
        self.groups.clear();
        self.history.clear();
    }

    /// Removes a student from its group, then from the map.
    pub fn remove_student(&mut self, id: StudentId) -> Option<Student> {
        let idx = student_index(&self.students, id)?;
        self.record();
        self.detach_from_group(id);
        Some(self.students.remove(idx))
    }

    pub(crate) fn detach_from_group(&mut self, id: StudentId) -> Option<GroupId> {
        let gid = self.student(id)?.group_id?;
        let gidx = group_index(&self.groups, gid)?;
        self.groups[gidx].members.retain(|m| *m != id);
        self.groups[gidx].update_bounds(&self.students);
        Some(gid)
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<(), SnapshotError> {
        snapshot::save(&Snapshot::capture(self), path)
    }

    /// Reads and applies a snapshot. Nothing changes if reading fails.
    pub fn load_snapshot(&mut self, path: &Path) -> Result<Snapshot, SnapshotError> {
        let snapshot = snapshot::load(path)?;
        self.apply_snapshot(&snapshot);
        Ok(snapshot)
    }

    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        self.record();
        snapshot.apply(self);
    }

    /// Saves the current layout as the next undo point.
    pub fn record(&mut self) {
        let state = self.layout_state();
        self.history.push(state);
    }

    pub fn undo(&mut self) -> bool {
        let current = self.layout_state();
        match self.history.undo(current) {
            Some(prev) => {
                self.restore(prev);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.layout_state();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn layout_state(&self) -> LayoutState {
        LayoutState {
            students: self
                .students
                .iter()
                .map(|s| (s.id, s.position, s.group_id))
                .collect(),
            groups: self.groups.clone(),
        }
    }

    fn restore(&mut self, state: LayoutState) {
        for (id, position, group_id) in state.students {
            if let Some(idx) = student_index(&self.students, id) {
                self.students[idx].position = position;
                self.students[idx].group_id = group_id;
            }
        }
        self.groups = state.groups;
        let students = &self.students;
        for group in &mut self.groups {
            group.members.retain(|m| students.iter().any(|s| s.id == *m));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_with(names: &[&str]) -> Session {
        let mut session = Session::new(Canvas::new(1200, 800));
        for (i, name) in names.iter().enumerate() {
            session.add_student(*name, None, Point::new(50 + i as i32 * 90, 90));
        }
        session
    }

    #[test]
    fn organize_empty_session_reports_nothing() {
        let mut session = Session::default();
        assert_eq!(
            session.organize(ArrangementStyle::Rows, LayoutParams::default()),
            OrganizeOutcome::NothingToArrange
        );
        assert!(!session.can_undo());
    }

    #[test]
    fn organize_groups_assigns_memberships() {
        let mut session = session_with(&["A", "B", "C", "D", "E", "F"]);
        let outcome = session.organize(ArrangementStyle::Groups, LayoutParams::new(4, 3));
        assert_eq!(
            outcome,
            OrganizeOutcome::Arranged {
                style: ArrangementStyle::Groups,
                students: 6,
                groups: 2
            }
        );
        for group in session.groups() {
            for id in &group.members {
                assert_eq!(session.student(*id).unwrap().group_id, Some(group.id));
            }
        }
    }

    #[test]
    fn organize_rows_drops_previous_groups() {
        let mut session = session_with(&["A", "B", "C", "D"]);
        session.organize(ArrangementStyle::Groups, LayoutParams::new(4, 2));
        session.organize(ArrangementStyle::Rows, LayoutParams::new(2, 2));
        assert!(session.groups().is_empty());
        assert!(session.students().iter().all(|s| s.group_id.is_none()));
    }

    #[test]
    fn clear_groups_keeps_positions() {
        let mut session = session_with(&["A", "B", "C", "D", "E"]);
        session.organize(ArrangementStyle::Groups, LayoutParams::new(4, 2));
        let before: Vec<Point> = session.students().iter().map(|s| s.position).collect();
        assert_eq!(session.clear_groups(), 3);
        let after: Vec<Point> = session.students().iter().map(|s| s.position).collect();
        assert_eq!(before, after);
        assert!(session.groups().is_empty());
        assert_eq!(session.ungrouped().count(), 5);
    }

    #[test]
    fn remove_student_leaves_its_group_first() {
        let mut session = session_with(&["A", "B", "C"]);
        session.organize(ArrangementStyle::Groups, LayoutParams::new(4, 3));
        let id = session.student_by_name("B").unwrap().id;
        let removed = session.remove_student(id).unwrap();
        assert_eq!(removed.name, "B");
        assert!(!session.groups()[0].contains(id));
        assert_eq!(session.groups()[0].members.len(), 2);
        assert!(session.remove_student(id).is_none());
    }

    #[test]
    fn undo_restores_layout_and_redo_reapplies() {
        let mut session = session_with(&["A", "B", "C", "D"]);
        let original: Vec<Point> = session.students().iter().map(|s| s.position).collect();
        session.organize(ArrangementStyle::Groups, LayoutParams::new(4, 2));
        let grouped: Vec<Point> = session.students().iter().map(|s| s.position).collect();

        assert!(session.undo());
        let restored: Vec<Point> = session.students().iter().map(|s| s.position).collect();
        assert_eq!(restored, original);
        assert!(session.groups().is_empty());

        assert!(session.redo());
        let again: Vec<Point> = session.students().iter().map(|s| s.position).collect();
        assert_eq!(again, grouped);
        assert_eq!(session.groups().len(), 2);
    }

    #[test]
    fn loading_photos_replaces_the_class() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for name in ["Ana", "Bo", "Cy"] {
            let path = dir.path().join(format!("{name}.png"));
            RgbaImage::from_pixel(40, 50, image::Rgba([0, 0, 255, 255]))
                .save(&path)
                .unwrap();
            paths.push(path);
        }
        let mut session = session_with(&["Old"]);
        session.organize(ArrangementStyle::Groups, LayoutParams::default());

        let report = session.load_photos(&paths, &ImportLimits::default());
        assert_eq!(report.loaded, 3);
        assert!(session.student_by_name("Old").is_none());
        assert!(session.groups().is_empty());
        assert!(!session.can_undo());
        let positions: Vec<Point> = session.students().iter().map(|s| s.position).collect();
        assert_eq!(
            positions,
            [Point::new(50, 90), Point::new(140, 90), Point::new(230, 90)]
        );
        assert!(session.students().iter().all(|s| s.photo.is_some()));
    }

    #[test]
    fn reset_drops_everything() {
        let mut session = session_with(&["A", "B"]);
        session.organize(ArrangementStyle::Circle, LayoutParams::default());
        session.reset();
        assert!(session.is_empty());
        assert!(session.groups().is_empty());
        assert!(!session.can_undo());
    }
}
