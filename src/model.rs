use image::RgbaImage;
use serde::{Deserialize, Serialize};

pub const STUDENT_WIDTH: i32 = 80;
pub const STUDENT_HEIGHT: i32 = 100;

/// Height of the control band at the top of the canvas. Nothing may be
/// dragged into it.
pub const TOP_BAND: i32 = 70;

const GROUP_MARGIN_X: i32 = 20;
const GROUP_MARGIN_TOP: i32 = 35;
const GROUP_MARGIN_BOTTOM: i32 = 20;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset_from(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const EMPTY: Rect = Rect {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn right(self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    pub fn inflate(self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.x - dx,
            self.y - dy,
            self.width + dx * 2,
            self.height + dy * 2,
        )
    }

    pub fn union(self, other: Rect) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Self::new(x, y, right - x, bottom - y)
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

pub const GROUP_PALETTE: [Rgba; 8] = [
    Rgba::new(255, 182, 193, 100),
    Rgba::new(173, 216, 230, 100),
    Rgba::new(144, 238, 144, 100),
    Rgba::new(255, 218, 185, 100),
    Rgba::new(221, 160, 221, 100),
    Rgba::new(255, 255, 224, 100),
    Rgba::new(255, 160, 122, 100),
    Rgba::new(176, 196, 222, 100),
];

pub fn palette_color(id: GroupId) -> Rgba {
    GROUP_PALETTE[id.0 as usize % GROUP_PALETTE.len()]
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StudentId(pub u64);

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u32);

/// The drawable area, in canvas coordinates. The top `band` pixels belong to
/// the control panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Canvas {
    pub width: i32,
    pub height: i32,
    pub band: i32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 800,
            band: TOP_BAND,
        }
    }
}

impl Canvas {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            band: TOP_BAND,
        }
    }

    /// Keeps a rectangle of `size` at `pos` inside the canvas and below the
    /// band. When the canvas is too small the lower bound wins.
    pub fn clamp_position(&self, pos: Point, size: Size) -> Point {
        Point::new(
            pos.x.min(self.width - size.width).max(0),
            pos.y.min(self.height - size.height).max(self.band),
        )
    }
}

#[derive(Clone)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub photo: Option<RgbaImage>,
    pub position: Point,
    pub size: Size,
    pub group_id: Option<GroupId>,
}

impl std::fmt::Debug for Student {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Student")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("photo", &self.photo.as_ref().map(|p| p.dimensions()))
            .field("position", &self.position)
            .field("size", &self.size)
            .field("group_id", &self.group_id)
            .finish()
    }
}

impl Student {
    pub fn new(id: StudentId, name: impl Into<String>, photo: Option<RgbaImage>) -> Self {
        Self {
            id,
            name: name.into(),
            photo,
            position: Point::default(),
            size: Size::new(STUDENT_WIDTH, STUDENT_HEIGHT),
            group_id: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub id: GroupId,
    pub color: Rgba,
    pub bounds: Rect,
    pub members: Vec<StudentId>,
}

impl Group {
    pub fn new(id: GroupId) -> Self {
        Self {
            id,
            color: palette_color(id),
            bounds: Rect::EMPTY,
            members: Vec::new(),
        }
    }

    pub fn label(&self) -> String {
        format!("Group {}", self.id.0 + 1)
    }

    pub fn contains(&self, id: StudentId) -> bool {
        self.members.contains(&id)
    }

    /// Recomputes `bounds` from the current member rectangles.
    pub fn update_bounds(&mut self, students: &[Student]) {
        self.bounds = enclose(
            self.members
                .iter()
                .filter_map(|id| students.iter().find(|s| s.id == *id))
                .map(Student::bounds),
        );
    }
}

/// Smallest rectangle around `rects` plus the group margin. The top margin
/// leaves room for the label chip. No rectangles gives `Rect::EMPTY`.
pub fn enclose(rects: impl IntoIterator<Item = Rect>) -> Rect {
    rects
        .into_iter()
        .reduce(Rect::union)
        .map(|r| {
            Rect::new(
                r.x - GROUP_MARGIN_X,
                r.y - GROUP_MARGIN_TOP,
                r.width + GROUP_MARGIN_X * 2,
                r.height + GROUP_MARGIN_TOP + GROUP_MARGIN_BOTTOM,
            )
        })
        .unwrap_or(Rect::EMPTY)
}

pub fn student_index(students: &[Student], id: StudentId) -> Option<usize> {
    students.iter().position(|s| s.id == id)
}

pub fn group_index(groups: &[Group], id: GroupId) -> Option<usize> {
    groups.iter().position(|g| g.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student_at(id: u64, x: i32, y: i32) -> Student {
        let mut s = Student::new(StudentId(id), format!("S{id}"), None);
        s.position = Point::new(x, y);
        s
    }

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(10, 10, 5, 5);
        assert!(r.contains(Point::new(10, 10)));
        assert!(r.contains(Point::new(14, 14)));
        assert!(!r.contains(Point::new(15, 10)));
        assert!(!r.contains(Point::new(10, 15)));
        assert!(!Rect::EMPTY.contains(Point::new(0, 0)));
    }

    #[test]
    fn group_bounds_wrap_members_with_margin() {
        let students = vec![student_at(1, 100, 200), student_at(2, 300, 150)];
        let mut group = Group::new(GroupId(0));
        group.members = vec![StudentId(1), StudentId(2)];
        group.update_bounds(&students);
        assert_eq!(group.bounds, Rect::new(80, 115, 320, 205));
    }

    #[test]
    fn empty_group_has_empty_bounds() {
        let mut group = Group::new(GroupId(3));
        group.bounds = Rect::new(1, 2, 3, 4);
        group.update_bounds(&[]);
        assert_eq!(group.bounds, Rect::EMPTY);
    }

    #[test]
    fn palette_cycles_by_id() {
        assert_eq!(palette_color(GroupId(0)), palette_color(GroupId(8)));
        assert_ne!(palette_color(GroupId(0)), palette_color(GroupId(1)));
        assert_eq!(Group::new(GroupId(9)).label(), "Group 10");
    }

    #[test]
    fn clamp_keeps_student_below_band() {
        let canvas = Canvas::new(400, 300);
        let size = Size::new(STUDENT_WIDTH, STUDENT_HEIGHT);
        assert_eq!(
            canvas.clamp_position(Point::new(-40, 10), size),
            Point::new(0, TOP_BAND)
        );
        assert_eq!(
            canvas.clamp_position(Point::new(1000, 1000), size),
            Point::new(320, 200)
        );
    }
}
