use super::raster::{self, LabelKind, MapRaster};
use super::text::sorted_names;
use crate::error::ExportError;
use crate::session::Session;
use chrono::{DateTime, Local};
use printpdf::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const LANDSCAPE_W: f32 = 297.0;
const LANDSCAPE_H: f32 = 210.0;
const PORTRAIT_W: f32 = 210.0;
const PORTRAIT_H: f32 = 297.0;
const MARGIN_MM: f32 = 17.6;
const PT_TO_MM: f32 = 0.3528;

const TITLE_SIZE: f32 = 24.0;
const INFO_SIZE: f32 = 12.0;
const DETAILS_TITLE_SIZE: f32 = 20.0;
const HEADER_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 10.0;
const LINE_MM: f32 = 5.0;

/// Page 1 map area, measured from the top of the page.
const MAP_TOP_MM: f32 = 35.3;
const MAP_MAX_W: f32 = LANDSCAPE_W - 35.3;
const MAP_MAX_H: f32 = LANDSCAPE_H - 53.0;

const COL_GROUP_W: f32 = 35.0;
const COL_COUNT_W: f32 = 25.0;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

/// Width estimate for built-in Helvetica, which printpdf ships without
/// metrics.
fn text_width_mm(text: &str, size_pt: f32) -> f32 {
    text.chars().count() as f32 * size_pt * 0.5 * PT_TO_MM
}

fn centered_x(text: &str, size_pt: f32, page_w: f32) -> f32 {
    ((page_w - text_width_mm(text, size_pt)) / 2.0).max(MARGIN_MM)
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

pub fn build_pdf(
    session: &Session,
    generated: DateTime<Local>,
) -> Result<PdfDocumentReference, ExportError> {
    let map = raster::render_map(session)?;

    let (doc, page1, layer1) =
        PdfDocument::new("Class Map", Mm(LANDSCAPE_W), Mm(LANDSCAPE_H), "Layer 1");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(e.to_string()))?,
    };

    let layer = doc.get_page(page1).get_layer(layer1);
    draw_map_page(&layer, &fonts, session, map, generated);

    if !session.groups().is_empty() {
        draw_group_details(&doc, &fonts, session);
    }
    Ok(doc)
}

pub fn write_pdf(session: &Session, path: &Path) -> Result<(), ExportError> {
    let doc = build_pdf(session, Local::now())?;
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer)
        .map_err(|e| ExportError::Pdf(e.to_string()))?;
    Ok(())
}

fn draw_map_page(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    session: &Session,
    map: MapRaster,
    generated: DateTime<Local>,
) {
    let title = "CLASS MAP";
    layer.set_fill_color(rgb(0.0, 0.0, 0.0));
    layer.use_text(
        title,
        TITLE_SIZE,
        Mm(centered_x(title, TITLE_SIZE, LANDSCAPE_W)),
        Mm(LANDSCAPE_H - 14.1),
        &fonts.bold,
    );

    let info = format!(
        "Generated: {} | Students: {} | Groups: {}",
        generated.format("%d/%m/%Y %H:%M"),
        session.students().len(),
        session.groups().len()
    );
    layer.set_fill_color(rgb(0.4, 0.4, 0.4));
    layer.use_text(
        info.as_str(),
        INFO_SIZE,
        Mm(centered_x(&info, INFO_SIZE, LANDSCAPE_W)),
        Mm(LANDSCAPE_H - 22.9),
        &fonts.regular,
    );

    layer.set_outline_color(rgb(0.83, 0.83, 0.83));
    layer.set_outline_thickness(0.5);
    let sep_y = LANDSCAPE_H - 28.2;
    draw_line(layer, MARGIN_MM, sep_y, LANDSCAPE_W - MARGIN_MM, sep_y);

    // Fit preserving aspect ratio, centered horizontally below the separator.
    let (width_px, height_px) = map.image.dimensions();
    let aspect = width_px as f32 / height_px as f32;
    let (w_mm, h_mm) = if MAP_MAX_W / MAP_MAX_H > aspect {
        (MAP_MAX_H * aspect, MAP_MAX_H)
    } else {
        (MAP_MAX_W, MAP_MAX_W / aspect)
    };
    let x = (LANDSCAPE_W - w_mm) / 2.0;
    let y = LANDSCAPE_H - MAP_TOP_MM - h_mm;
    let scale = w_mm / width_px as f32;

    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: map.image.into_raw(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });
    let dpi = width_px as f32 / (w_mm / 25.4);
    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );

    layer.set_outline_color(rgb(0.5, 0.5, 0.5));
    layer.set_outline_thickness(0.3);
    draw_rect(layer, x, y, w_mm, h_mm);

    for label in &map.labels {
        let box_h_mm = label.rect.height as f32 * scale;
        let size_pt = (box_h_mm / PT_TO_MM * 0.7).clamp(3.0, 10.0);
        let top_mm = y + h_mm - label.rect.y as f32 * scale;
        let baseline = top_mm - box_h_mm + (box_h_mm - size_pt * PT_TO_MM) / 2.0 + 0.3;
        let (text_x, font) = match label.kind {
            LabelKind::GroupTitle => {
                layer.set_fill_color(rgb(0.0, 0.0, 0.0));
                (x + (label.rect.x as f32 + 3.0) * scale, &fonts.bold)
            }
            LabelKind::StudentName => {
                layer.set_fill_color(rgb(1.0, 1.0, 1.0));
                let box_w = label.rect.width as f32 * scale;
                let text_w = text_width_mm(&label.text, size_pt).min(box_w);
                (x + label.rect.x as f32 * scale + (box_w - text_w) / 2.0, &fonts.bold)
            }
        };
        layer.use_text(label.text.as_str(), size_pt, Mm(text_x), Mm(baseline), font);
    }
}

fn draw_group_details(doc: &PdfDocumentReference, fonts: &Fonts, session: &Session) {
    let mut groups: Vec<_> = session.groups().iter().collect();
    groups.sort_by_key(|g| g.id);

    let mut pages = DetailPages::new(doc, fonts);
    let members_w = PORTRAIT_W - 2.0 * MARGIN_MM - COL_GROUP_W - COL_COUNT_W;
    let chars_per_line = (members_w / (BODY_SIZE * 0.5 * PT_TO_MM)) as usize;

    pages.table_header();
    for group in groups {
        let names = sorted_names(group.members.iter().filter_map(|id| session.student(*id)));
        let lines = wrap(&names.join(", "), chars_per_line);
        let row_h = lines.len().max(1) as f32 * LINE_MM + 3.0;
        if pages.y - row_h < MARGIN_MM {
            pages.next_page();
            pages.table_header();
        }

        let top = pages.y;
        let layer = &pages.layer;
        layer.set_fill_color(rgb(0.0, 0.0, 0.0));
        let baseline = top - LINE_MM;
        layer.use_text(group.label(), BODY_SIZE, Mm(MARGIN_MM + 2.0), Mm(baseline), &fonts.bold);
        layer.use_text(
            names.len().to_string(),
            BODY_SIZE,
            Mm(MARGIN_MM + COL_GROUP_W + 2.0),
            Mm(baseline),
            &fonts.regular,
        );
        for (i, line) in lines.iter().enumerate() {
            layer.use_text(
                line.as_str(),
                BODY_SIZE,
                Mm(MARGIN_MM + COL_GROUP_W + COL_COUNT_W + 2.0),
                Mm(baseline - i as f32 * LINE_MM),
                &fonts.regular,
            );
        }
        pages.y -= row_h;
        layer.set_outline_color(rgb(0.8, 0.8, 0.8));
        layer.set_outline_thickness(0.3);
        draw_line(layer, MARGIN_MM, pages.y, PORTRAIT_W - MARGIN_MM, pages.y);
    }

    let ungrouped = sorted_names(session.ungrouped());
    if ungrouped.is_empty() {
        return;
    }
    let wide = ((PORTRAIT_W - 2.0 * MARGIN_MM) / (BODY_SIZE * 0.5 * PT_TO_MM)) as usize;
    let lines = wrap(&ungrouped.join(", "), wide);
    if pages.y - 2.0 * LINE_MM - LINE_MM < MARGIN_MM {
        pages.next_page();
    }
    pages.y -= 2.0 * LINE_MM;
    pages.layer.set_fill_color(rgb(0.0, 0.0, 0.0));
    pages.layer.use_text(
        format!("UNGROUPED ({})", ungrouped.len()),
        HEADER_SIZE,
        Mm(MARGIN_MM),
        Mm(pages.y),
        &fonts.bold,
    );
    for line in lines {
        if pages.y - LINE_MM < MARGIN_MM {
            pages.next_page();
        }
        pages.y -= LINE_MM;
        pages
            .layer
            .use_text(line, BODY_SIZE, Mm(MARGIN_MM), Mm(pages.y), &fonts.regular);
    }
}

/// Portrait pages for the group table, opened on demand.
struct DetailPages<'a> {
    doc: &'a PdfDocumentReference,
    fonts: &'a Fonts,
    layer: PdfLayerReference,
    y: f32,
}

impl<'a> DetailPages<'a> {
    fn new(doc: &'a PdfDocumentReference, fonts: &'a Fonts) -> Self {
        let (page, layer) = doc.add_page(Mm(PORTRAIT_W), Mm(PORTRAIT_H), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let title = "GROUP DETAILS";
        layer.set_fill_color(rgb(0.0, 0.0, 0.0));
        layer.use_text(
            title,
            DETAILS_TITLE_SIZE,
            Mm(centered_x(title, DETAILS_TITLE_SIZE, PORTRAIT_W)),
            Mm(PORTRAIT_H - MARGIN_MM),
            &fonts.bold,
        );
        Self {
            doc,
            fonts,
            layer,
            y: PORTRAIT_H - MARGIN_MM - 14.0,
        }
    }

    fn next_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PORTRAIT_W), Mm(PORTRAIT_H), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PORTRAIT_H - MARGIN_MM;
    }

    fn table_header(&mut self) {
        let baseline = self.y - LINE_MM;
        self.layer.set_fill_color(rgb(0.0, 0.0, 0.0));
        for (text, x) in [
            ("GROUP", MARGIN_MM + 2.0),
            ("STUDENTS", MARGIN_MM + COL_GROUP_W + 2.0),
            ("MEMBERS", MARGIN_MM + COL_GROUP_W + COL_COUNT_W + 2.0),
        ] {
            self.layer
                .use_text(text, HEADER_SIZE, Mm(x), Mm(baseline), &self.fonts.bold);
        }
        self.y -= LINE_MM + 3.0;
        self.layer.set_outline_color(rgb(0.0, 0.0, 0.0));
        self.layer.set_outline_thickness(0.5);
        draw_line(
            &self.layer,
            MARGIN_MM,
            self.y,
            PORTRAIT_W - MARGIN_MM,
            self.y,
        );
    }
}

/// Greedy word wrap on `", "`-joined names. A single word longer than the
/// line stays whole.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in text.split(' ') {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn draw_line(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    let points = vec![
        (Point::new(Mm(x1), Mm(y1)), false),
        (Point::new(Mm(x2), Mm(y2)), false),
    ];
    layer.add_line(Line {
        points,
        is_closed: false,
    });
}

fn draw_rect(layer: &PdfLayerReference, x: f32, y: f32, w: f32, h: f32) {
    draw_line(layer, x, y, x + w, y);
    draw_line(layer, x + w, y, x + w, y + h);
    draw_line(layer, x + w, y + h, x, y + h);
    draw_line(layer, x, y + h, x, y);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_breaks_between_words() {
        let lines = wrap("Ana, Bea, Cid, Dan", 9);
        assert_eq!(lines, ["Ana, Bea,", "Cid, Dan"]);
        assert_eq!(wrap("Maximiliano", 4), ["Maximiliano"]);
        assert!(wrap("", 10).is_empty());
    }

    #[test]
    fn centered_text_never_enters_margin() {
        let long = "x".repeat(400);
        assert_eq!(centered_x(&long, 12.0, LANDSCAPE_W), MARGIN_MM);
        assert!(centered_x("CLASS MAP", TITLE_SIZE, LANDSCAPE_W) > 100.0);
    }
}
