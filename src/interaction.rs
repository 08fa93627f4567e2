use crate::layout;
use crate::model::{GroupId, Point, Student, StudentId, group_index, student_index};
use crate::session::Session;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cursor {
    #[default]
    Default,
    Grab,
    Grabbing,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        student: StudentId,
        /// Press point minus the student's origin at grab time.
        offset: Point,
        moved: bool,
    },
}

/// A membership change made by dropping a student on another group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
    pub student: StudentId,
    pub from: Option<GroupId>,
    pub to: GroupId,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

/// Topmost student under `p`. Later students are drawn on top.
pub fn hit_test(students: &[Student], p: Point) -> Option<StudentId> {
    students
        .iter()
        .rev()
        .find(|s| s.bounds().contains(p))
        .map(|s| s.id)
}

impl DragController {
    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn dragged(&self) -> Option<StudentId> {
        match self.state {
            DragState::Dragging { student, .. } => Some(student),
            DragState::Idle => None,
        }
    }

    pub fn press(&mut self, session: &Session, p: Point) -> Option<StudentId> {
        let id = hit_test(session.students(), p)?;
        let origin = session.student(id)?.position;
        self.state = DragState::Dragging {
            student: id,
            offset: p.offset_from(origin),
            moved: false,
        };
        Some(id)
    }

    pub fn drag_to(&mut self, session: &mut Session, p: Point) {
        let DragState::Dragging {
            student,
            offset,
            moved,
        } = &mut self.state
        else {
            return;
        };
        if !*moved {
            session.record();
            *moved = true;
        }
        let Some(idx) = student_index(&session.students, *student) else {
            return;
        };
        let size = session.students[idx].size;
        let target = Point::new(p.x - offset.x, p.y - offset.y);
        session.students[idx].position = session.canvas.clamp_position(target, size);

        if let Some(gid) = session.students[idx].group_id {
            if let Some(gidx) = group_index(&session.groups, gid) {
                session.groups[gidx].update_bounds(&session.students);
            }
        }
    }

    pub fn hover(&self, session: &Session, p: Point) -> Cursor {
        if self.dragged().is_some() {
            return Cursor::Grabbing;
        }
        match hit_test(session.students(), p) {
            Some(_) => Cursor::Grab,
            None => Cursor::Default,
        }
    }

    /// Ends the drag. Dropping onto another group's area moves the student
    /// into that group.
    pub fn release(&mut self, session: &mut Session, p: Point) -> Option<Transfer> {
        let state = std::mem::take(&mut self.state);
        let DragState::Dragging { student, moved, .. } = state else {
            return None;
        };
        let target = transfer_target(session, student, p)?;
        if !moved {
            session.record();
        }
        transfer(session, student, target)
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

/// First group in list order whose area contains `drop`, other than the
/// student's own.
pub fn transfer_target(session: &Session, student: StudentId, drop: Point) -> Option<GroupId> {
    let current = session.student(student)?.group_id;
    session
        .groups()
        .iter()
        .find(|g| g.bounds.contains(drop) && Some(g.id) != current)
        .map(|g| g.id)
}

/// Moves `student` into group `to`, re-seating both the old group (if it
/// still has members) and the new one. Emptied groups are kept.
pub fn transfer(session: &mut Session, student: StudentId, to: GroupId) -> Option<Transfer> {
    let to_idx = group_index(&session.groups, to)?;
    let idx = student_index(&session.students, student)?;

    let from = session.detach_from_group(student);
    if let Some(gidx) = from.and_then(|gid| group_index(&session.groups, gid)) {
        if !session.groups[gidx].members.is_empty() {
            layout::relayout_group(&mut session.groups[gidx], &mut session.students);
        }
    }

    session.students[idx].group_id = Some(to);
    session.groups[to_idx].members.push(student);
    layout::relayout_group(&mut session.groups[to_idx], &mut session.students);

    log::debug!("moved student {} from {:?} to group {}", student.0, from, to.0);
    Some(Transfer { student, from, to })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ArrangementStyle, LayoutParams};
    use crate::model::{Canvas, Rect, TOP_BAND};

    fn grouped_session() -> Session {
        let mut session = Session::new(Canvas::new(1200, 800));
        for name in ["A", "B", "C", "D"] {
            session.add_student(name, None, Point::new(0, 0));
        }
        session.organize(ArrangementStyle::Groups, LayoutParams::new(4, 2));
        session
    }

    fn id_of(session: &Session, name: &str) -> StudentId {
        session.student_by_name(name).unwrap().id
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let mut session = Session::default();
        let below = session.add_student("below", None, Point::new(100, 100));
        let above = session.add_student("above", None, Point::new(120, 120));
        assert_eq!(hit_test(session.students(), Point::new(130, 130)), Some(above));
        assert_eq!(hit_test(session.students(), Point::new(105, 105)), Some(below));
        assert_eq!(hit_test(session.students(), Point::new(5, 5)), None);
    }

    #[test]
    fn drag_keeps_grab_offset_and_clamps() {
        let mut session = Session::new(Canvas::new(800, 600));
        let id = session.add_student("A", None, Point::new(100, 200));
        let mut drag = DragController::default();
        assert_eq!(drag.press(&session, Point::new(110, 230)), Some(id));

        drag.drag_to(&mut session, Point::new(310, 330));
        assert_eq!(session.student(id).unwrap().position, Point::new(300, 300));

        drag.drag_to(&mut session, Point::new(-50, 0));
        assert_eq!(session.student(id).unwrap().position, Point::new(0, TOP_BAND));

        drag.drag_to(&mut session, Point::new(5000, 5000));
        assert_eq!(session.student(id).unwrap().position, Point::new(720, 500));
        assert!(drag.release(&mut session, Point::new(5000, 5000)).is_none());
        assert_eq!(drag.state(), DragState::Idle);
        assert!(session.can_undo());
    }

    #[test]
    fn press_on_empty_space_stays_idle() {
        let mut session = Session::default();
        session.add_student("A", None, Point::new(100, 100));
        let mut drag = DragController::default();
        assert_eq!(drag.press(&session, Point::new(500, 500)), None);
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(drag.hover(&session, Point::new(500, 500)), Cursor::Default);
        assert_eq!(drag.hover(&session, Point::new(110, 110)), Cursor::Grab);
    }

    #[test]
    fn dragging_grouped_student_updates_group_bounds() {
        let mut session = grouped_session();
        let a = id_of(&session, "A");
        let before = session.groups()[0].bounds;
        let origin = session.student(a).unwrap().position;
        let mut drag = DragController::default();
        drag.press(&session, origin);
        drag.drag_to(&mut session, Point::new(origin.x, origin.y + 50));
        let after = session.groups()[0].bounds;
        assert_ne!(before, after);
        let moved = session.student(a).unwrap().bounds();
        assert!(after.contains(Point::new(moved.x, moved.y)));
        drag.cancel();
        assert!(drag.dragged().is_none());
    }

    #[test]
    fn drop_on_other_group_transfers_membership() {
        let mut session = grouped_session();
        let a = id_of(&session, "A");
        let target = session.groups()[1].bounds;
        let origin = session.student(a).unwrap().position;

        let mut drag = DragController::default();
        drag.press(&session, Point::new(origin.x + 5, origin.y + 5));
        let drop = Point::new(target.x + 30, target.y + 40);
        drag.drag_to(&mut session, drop);
        let t = drag.release(&mut session, drop).unwrap();

        assert_eq!(t.from, Some(GroupId(0)));
        assert_eq!(t.to, GroupId(1));
        assert!(!session.groups()[0].contains(a));
        assert_eq!(session.groups()[1].members.last(), Some(&a));
        assert_eq!(session.student(a).unwrap().group_id, Some(GroupId(1)));
        // group 1 sits in slot 1 of the relayout grid
        assert_eq!(session.student(a).unwrap().position, Point::new(510, 100));
    }

    #[test]
    fn emptied_group_is_kept() {
        let mut session = Session::new(Canvas::new(1200, 800));
        for name in ["A", "B", "C"] {
            session.add_student(name, None, Point::new(0, 0));
        }
        session.organize(ArrangementStyle::Groups, LayoutParams::new(4, 2));
        let c = id_of(&session, "C");
        let t = transfer(&mut session, c, GroupId(0)).unwrap();
        assert_eq!(t.from, Some(GroupId(1)));
        assert_eq!(session.groups().len(), 2);
        assert!(session.groups()[1].members.is_empty());
        assert_eq!(session.groups()[1].bounds, Rect::EMPTY);
        assert_eq!(session.groups()[0].members.len(), 3);
    }

    #[test]
    fn drop_on_own_group_changes_nothing() {
        let mut session = grouped_session();
        let a = id_of(&session, "A");
        let own = session.groups()[0].bounds;
        assert_eq!(
            transfer_target(&session, a, Point::new(own.x + 1, own.y + 1)),
            None
        );
    }
}
