use crate::model::{
    Canvas, Group, GroupId, Point, Rect, Rgba, Student, StudentId, enclose, palette_color,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ArrangementStyle {
    #[default]
    Rows,
    UShape,
    Circle,
    Groups,
}

impl ArrangementStyle {
    pub const ALL: [ArrangementStyle; 4] = [
        ArrangementStyle::Rows,
        ArrangementStyle::UShape,
        ArrangementStyle::Circle,
        ArrangementStyle::Groups,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ArrangementStyle::Rows => "Rows",
            ArrangementStyle::UShape => "U-shape",
            ArrangementStyle::Circle => "Circle",
            ArrangementStyle::Groups => "Groups",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutParams {
    pub per_row: usize,
    pub group_size: usize,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            per_row: 4,
            group_size: 2,
        }
    }
}

impl LayoutParams {
    pub fn new(per_row: usize, group_size: usize) -> Self {
        Self {
            per_row: per_row.max(1),
            group_size: group_size.max(1),
        }
    }
}

/// A group produced by the Groups style, ready to be installed in a session.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupPlan {
    pub id: GroupId,
    pub color: Rgba,
    pub members: Vec<StudentId>,
    pub bounds: Rect,
}

impl GroupPlan {
    pub fn into_group(self) -> Group {
        Group {
            id: self.id,
            color: self.color,
            bounds: self.bounds,
            members: self.members,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Arrangement {
    pub positions: Vec<(StudentId, Point)>,
    pub groups: Vec<GroupPlan>,
}

impl Arrangement {
    pub fn position_of(&self, id: StudentId) -> Option<Point> {
        self.positions
            .iter()
            .find(|(sid, _)| *sid == id)
            .map(|(_, p)| *p)
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Students sorted by name, ties broken by id.
pub fn ordered(students: &[Student]) -> Vec<&Student> {
    let mut ordered: Vec<&Student> = students.iter().collect();
    ordered.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    ordered
}

pub fn arrange(
    style: ArrangementStyle,
    students: &[Student],
    params: LayoutParams,
    canvas: &Canvas,
) -> Arrangement {
    if students.is_empty() {
        return Arrangement::default();
    }
    let ordered = ordered(students);
    let arrangement = match style {
        ArrangementStyle::Rows => rows(&ordered, params.per_row.max(1), canvas),
        ArrangementStyle::UShape => u_shape(&ordered, canvas),
        ArrangementStyle::Circle => circle(&ordered, canvas),
        ArrangementStyle::Groups => groups(&ordered, params.group_size.max(1), canvas),
    };
    log::debug!(
        "{} arrangement: {} students, {} groups",
        style.label(),
        arrangement.positions.len(),
        arrangement.groups.len()
    );
    arrangement
}

fn rows(ordered: &[&Student], per_row: usize, canvas: &Canvas) -> Arrangement {
    const START_X: i32 = 80;
    const START_Y: i32 = 140;
    const SPACING_Y: i32 = 130;

    let per_row_i = i64::try_from(per_row).unwrap_or(i64::MAX);
    let available = i64::from(canvas.width) - 160;
    let mut spacing_x: i64 = 100;
    if per_row_i.saturating_mul(spacing_x) > available {
        spacing_x = available / per_row_i;
    }
    let spacing_x = spacing_x as i32;

    let positions = ordered
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let row = (i / per_row) as i32;
            let col = (i % per_row) as i32;
            (
                s.id,
                Point::new(START_X + col * spacing_x, START_Y + row * SPACING_Y),
            )
        })
        .collect();
    Arrangement {
        positions,
        groups: Vec::new(),
    }
}

fn u_shape(ordered: &[&Student], canvas: &Canvas) -> Arrangement {
    const START_Y: i32 = 120;
    const SPACING: i32 = 100;

    let n = ordered.len();
    let cx = canvas.width / 2;
    let arm = (n / 3).min(6);
    let mut positions = Vec::with_capacity(n);
    let mut rest = ordered.iter();

    let left = arm.min(n);
    for (i, s) in rest.by_ref().take(left).enumerate() {
        positions.push((s.id, Point::new(cx - 250, START_Y + i as i32 * SPACING)));
    }

    let base_y = START_Y + left as i32 * SPACING + 50;
    let base = (n - left).min(5);
    let base_step = 400 / (base as i32 - 1).max(1);
    for (i, s) in rest.by_ref().take(base).enumerate() {
        positions.push((s.id, Point::new(cx - 200 + i as i32 * base_step, base_y)));
    }

    for (i, s) in rest.enumerate() {
        positions.push((s.id, Point::new(cx + 250, base_y - 50 - i as i32 * SPACING)));
    }

    Arrangement {
        positions,
        groups: Vec::new(),
    }
}

/// Angle of seat `i` out of `n`, starting at twelve o'clock.
pub fn circle_angle(i: usize, n: usize) -> f64 {
    i as f64 * 2.0 * PI / n as f64 - PI / 2.0
}

fn circle(ordered: &[&Student], canvas: &Canvas) -> Arrangement {
    let n = ordered.len();
    let cx = canvas.width / 2;
    let cy = (canvas.height + 120) / 2;
    let radius = f64::from((cx - 150).min(cy - 100));

    let positions = ordered
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let angle = circle_angle(i, n);
            let x = cx + (radius * angle.cos()) as i32 - s.size.width / 2;
            let y = cy + (radius * angle.sin()) as i32 - s.size.height / 2;
            let x = x.min(canvas.width - s.size.width - 10).max(10);
            let y = y.min(canvas.height - s.size.height - 10).max(120);
            (s.id, Point::new(x, y))
        })
        .collect();
    Arrangement {
        positions,
        groups: Vec::new(),
    }
}

fn members_per_row(count: usize) -> usize {
    match count {
        0..=2 => count.max(1),
        3..=4 => 2,
        _ => 3,
    }
}

fn groups(ordered: &[&Student], group_size: usize, canvas: &Canvas) -> Arrangement {
    const SPACING_Y: i32 = 280;
    const MEMBER_SPACING_X: i32 = 100;
    const MEMBER_SPACING_Y: i32 = 120;
    const START_X: i32 = 50;
    const START_Y: i32 = 100;
    const PADDING: i32 = 15;

    let spacing_x = (canvas.width / 3).max(300);
    let mut groups_per_row = 2;
    let mut arrangement = Arrangement::default();

    for (k, chunk) in ordered.chunks(group_size).enumerate() {
        let k_i = k as i32;
        let mut group_x = START_X + (k_i % groups_per_row) * spacing_x;
        let mut group_y = START_Y + (k_i / groups_per_row) * SPACING_Y;
        if group_x + 2 * MEMBER_SPACING_X > canvas.width {
            groups_per_row = 1;
            group_x = START_X;
            group_y = START_Y + k_i * SPACING_Y;
        }

        let cols = members_per_row(chunk.len());
        let mut rects = Vec::with_capacity(chunk.len());
        for (m, s) in chunk.iter().enumerate() {
            let pos = Point::new(
                group_x + (m % cols) as i32 * MEMBER_SPACING_X,
                group_y + (m / cols) as i32 * MEMBER_SPACING_Y,
            );
            arrangement.positions.push((s.id, pos));
            rects.push(Rect::from_origin_size(pos, s.size));
        }

        let id = GroupId(k as u32);
        arrangement.groups.push(GroupPlan {
            id,
            color: palette_color(id),
            members: chunk.iter().map(|s| s.id).collect(),
            bounds: enclose(rects).inflate(PADDING, PADDING),
        });
    }
    arrangement
}

/// Re-seats the members of `group` on its fixed slot of the group grid and
/// recomputes its bounds. Used after a transfer changes membership.
pub fn relayout_group(group: &mut Group, students: &mut [Student]) {
    const SLOTS_PER_ROW: u32 = 3;
    const SLOT_WIDTH: i32 = 280;
    const SLOT_HEIGHT: i32 = 250;
    const SPACING_X: i32 = 90;
    const SPACING_Y: i32 = 110;

    if group.members.is_empty() {
        return;
    }
    let cols = group.members.len().min(3);
    let origin_x = 50 + (group.id.0 % SLOTS_PER_ROW) as i32 * SLOT_WIDTH;
    let origin_y = 100 + (group.id.0 / SLOTS_PER_ROW) as i32 * SLOT_HEIGHT;

    for (i, id) in group.members.iter().enumerate() {
        if let Some(s) = students.iter_mut().find(|s| s.id == *id) {
            s.position = Point::new(
                origin_x + (i % cols) as i32 * SPACING_X,
                origin_y + (i / cols) as i32 * SPACING_Y,
            );
        }
    }
    group.update_bounds(students);
}
