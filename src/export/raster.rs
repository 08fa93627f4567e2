use crate::error::ExportError;
use crate::model::{Point, Rect, Rgba, Student};
use crate::session::Session;
use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage, RgbaImage};

const PADDING: i32 = 20;
const MIN_WIDTH: i32 = 800;
const MIN_HEIGHT: i32 = 600;
const MAX_SIZE: i32 = 4000;

const SHADOW: Rgba = Rgba::new(0, 0, 0, 30);
const BORDER: Rgba = Rgba::new(169, 169, 169, 255);
const NAME_BAND: Rgba = Rgba::new(0, 0, 0, 160);
const PLACEHOLDER: Rgba = Rgba::new(220, 220, 220, 255);
const CHIP: Rgba = Rgba::new(255, 255, 255, 255);

pub const NAME_BAND_HEIGHT: i32 = 14;
pub const CHIP_HEIGHT: i32 = 18;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelKind {
    GroupTitle,
    StudentName,
}

/// Text to be drawn over the raster, in raster pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub kind: LabelKind,
    pub text: String,
    pub rect: Rect,
}

pub struct MapRaster {
    pub image: RgbImage,
    /// Canvas coordinates of the raster's top-left pixel.
    pub origin: Point,
    pub labels: Vec<Label>,
}

/// Rough width of `text` in pixels for the chip and band sizing; the PDF
/// layer uses built-in fonts without metrics.
pub fn approx_text_width(text: &str, px_per_char: i32) -> i32 {
    text.chars().count() as i32 * px_per_char
}

pub fn render_map(session: &Session) -> Result<MapRaster, ExportError> {
    let students = session.students();
    let Some(extent) = students.iter().map(Student::bounds).reduce(Rect::union) else {
        return Err(ExportError::NothingToExport);
    };
    let origin = Point::new(extent.x - PADDING, extent.y - PADDING);
    let width = (extent.width + PADDING * 2).max(MIN_WIDTH).min(MAX_SIZE);
    let height = (extent.height + PADDING * 2).max(MIN_HEIGHT).min(MAX_SIZE);
    let shift = |r: Rect| {
        Rect::new(
            r.x.saturating_sub(origin.x),
            r.y.saturating_sub(origin.y),
            r.width,
            r.height,
        )
    };

    let mut canvas = RgbaImage::from_pixel(
        width as u32,
        height as u32,
        image::Rgba([255, 255, 255, 255]),
    );
    let mut labels = Vec::new();

    for group in session.groups().iter().filter(|g| !g.members.is_empty()) {
        let bounds = shift(group.bounds);
        fill(&mut canvas, bounds, group.color.with_alpha(60));
        stroke(&mut canvas, bounds, group.color.with_alpha(150), 2);

        let text = group.label();
        let chip = Rect::new(
            bounds.x + 5,
            bounds.y + 5,
            approx_text_width(&text, 8) + 6,
            CHIP_HEIGHT,
        );
        fill(&mut canvas, chip, CHIP);
        stroke(&mut canvas, chip, BORDER, 1);
        labels.push(Label {
            kind: LabelKind::GroupTitle,
            text,
            rect: chip,
        });
    }

    for student in students {
        let card = shift(student.bounds());
        fill(&mut canvas, Rect::new(card.x + 2, card.y + 2, card.width, card.height), SHADOW);
        match &student.photo {
            Some(photo) => paste(&mut canvas, photo, card),
            None => fill(&mut canvas, card, PLACEHOLDER),
        }
        stroke(&mut canvas, card, BORDER, 1);

        let band = Rect::new(
            card.x,
            card.bottom() - NAME_BAND_HEIGHT,
            card.width,
            NAME_BAND_HEIGHT,
        );
        fill(&mut canvas, band, NAME_BAND);
        labels.push(Label {
            kind: LabelKind::StudentName,
            text: student.name.clone(),
            rect: band,
        });
    }

    let image = DynamicImage::ImageRgba8(canvas).to_rgb8();
    log::debug!(
        "rendered map {}x{} with {} labels",
        image.width(),
        image.height(),
        labels.len()
    );
    Ok(MapRaster {
        image,
        origin,
        labels,
    })
}

fn paste(canvas: &mut RgbaImage, photo: &RgbaImage, card: Rect) {
    let (w, h) = (card.width.max(1) as u32, card.height.max(1) as u32);
    if photo.dimensions() == (w, h) {
        imageops::overlay(canvas, photo, i64::from(card.x), i64::from(card.y));
    } else {
        let scaled = imageops::resize(photo, w, h, FilterType::CatmullRom);
        imageops::overlay(canvas, &scaled, i64::from(card.x), i64::from(card.y));
    }
}

fn blend(canvas: &mut RgbaImage, x: i32, y: i32, c: Rgba) {
    if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
        return;
    }
    let px = canvas.get_pixel_mut(x as u32, y as u32);
    let a = u32::from(c.a);
    let mix = |dst: u8, src: u8| ((u32::from(src) * a + u32::from(dst) * (255 - a)) / 255) as u8;
    px.0 = [mix(px.0[0], c.r), mix(px.0[1], c.g), mix(px.0[2], c.b), 255];
}

fn fill(canvas: &mut RgbaImage, r: Rect, c: Rgba) {
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    for y in r.y.max(0)..r.bottom().min(h) {
        for x in r.x.max(0)..r.right().min(w) {
            blend(canvas, x, y, c);
        }
    }
}

fn stroke(canvas: &mut RgbaImage, r: Rect, c: Rgba, width: i32) {
    if r.is_empty() {
        return;
    }
    let w = width.min(r.width).min(r.height);
    fill(canvas, Rect::new(r.x, r.y, r.width, w), c);
    fill(canvas, Rect::new(r.x, r.bottom() - w, r.width, w), c);
    fill(canvas, Rect::new(r.x, r.y + w, w, r.height - 2 * w), c);
    fill(canvas, Rect::new(r.right() - w, r.y + w, w, r.height - 2 * w), c);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ArrangementStyle, LayoutParams};
    use crate::model::Canvas;

    #[test]
    fn empty_session_has_nothing_to_render() {
        assert!(matches!(
            render_map(&Session::default()),
            Err(ExportError::NothingToExport)
        ));
    }

    #[test]
    fn raster_covers_students_with_minimum_size() {
        let mut session = Session::default();
        session.add_student("A", None, Point::new(100, 100));
        let raster = render_map(&session).unwrap();
        assert_eq!(raster.image.dimensions(), (800, 600));
        assert_eq!(raster.origin, Point::new(80, 80));
        // white background away from the card
        assert_eq!(raster.image.get_pixel(700, 500).0, [255, 255, 255]);
    }

    #[test]
    fn raster_is_capped() {
        let mut session = Session::default();
        session.add_student("A", None, Point::new(0, 0));
        session.add_student("B", None, Point::new(9000, 100));
        let raster = render_map(&session).unwrap();
        assert_eq!(raster.image.width(), 4000);
        assert_eq!(raster.image.height(), 600);
    }

    #[test]
    fn photos_and_labels_are_placed() {
        let mut session = Session::new(Canvas::new(1200, 800));
        let photo = RgbaImage::from_pixel(80, 100, image::Rgba([10, 200, 30, 255]));
        session.add_student("Ana", Some(photo), Point::new(0, 0));
        session.add_student("Bo", None, Point::new(0, 0));
        session.organize(ArrangementStyle::Groups, LayoutParams::new(4, 2));
        let raster = render_map(&session).unwrap();

        let titles = raster
            .labels
            .iter()
            .filter(|l| l.kind == LabelKind::GroupTitle)
            .count();
        assert_eq!(titles, 1);
        let ana = raster.labels.iter().find(|l| l.text == "Ana").unwrap();
        // the photo shows just above the name band
        let px = raster
            .image
            .get_pixel((ana.rect.x + 40) as u32, (ana.rect.y - 20) as u32);
        assert_eq!(px.0, [10, 200, 30]);
        assert_eq!(ana.rect.height, NAME_BAND_HEIGHT);
    }

    #[test]
    fn oversized_group_bounds_are_clipped_to_the_image() {
        let mut session = Session::new(Canvas::new(1200, 800));
        session.add_student("Ana", None, Point::new(100, 100));
        session.add_student("Bo", None, Point::new(300, 100));
        session.organize(ArrangementStyle::Groups, LayoutParams::new(4, 2));
        session.groups[0].bounds = Rect::new(-5, 0, i32::MAX, i32::MAX);

        let raster = render_map(&session).unwrap();
        assert_eq!(raster.image.dimensions(), (800, 600));
    }
}
