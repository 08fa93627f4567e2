use classmap::{Group, Rgba, Student, StudentId};
use eframe::egui;
use std::collections::HashMap;

use super::{ClassMapApp, View};

const STUDENT_BORDER: egui::Color32 = egui::Color32::from_rgb(169, 169, 169);
const DRAGGED_BORDER: egui::Color32 = egui::Color32::from_rgb(220, 40, 40);
const NAME_BAND_HEIGHT: f32 = 16.0;

pub(super) fn color32(c: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

impl ClassMapApp {
    /// Uploads photos for new students and drops textures of students that
    /// are gone.
    pub(super) fn sync_textures(&mut self, ctx: &egui::Context) {
        let students = self.session.students();
        self.textures
            .retain(|id, _| students.iter().any(|s| s.id == *id));
        for student in students {
            if self.textures.contains_key(&student.id) {
                continue;
            }
            let Some(photo) = &student.photo else {
                continue;
            };
            let size = [photo.width() as usize, photo.height() as usize];
            let image = egui::ColorImage::from_rgba_unmultiplied(size, photo.as_raw());
            let texture = ctx.load_texture(
                format!("student-{}", student.id.0),
                image,
                egui::TextureOptions::LINEAR,
            );
            self.textures.insert(student.id, texture);
        }
    }
}

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect) {
    painter.rect_filled(rect, 0.0, egui::Color32::from_rgb(248, 248, 245));
}

pub(super) fn draw_groups(painter: &egui::Painter, view: &View, groups: &[Group]) {
    for group in groups.iter().filter(|g| !g.members.is_empty()) {
        let r = view.rect_to_screen(group.bounds);
        painter.rect_filled(r, 8.0, color32(group.color.with_alpha(60)));
        painter.rect_stroke(
            r,
            8.0,
            egui::Stroke::new(2.0, color32(group.color.with_alpha(150))),
            egui::StrokeKind::Inside,
        );

        let font_id = egui::FontId::proportional(13.0);
        let galley = painter.layout_no_wrap(group.label(), font_id, egui::Color32::BLACK);
        let chip = egui::Rect::from_min_size(
            r.min + egui::vec2(5.0, 5.0),
            galley.size() + egui::vec2(8.0, 4.0),
        );
        painter.rect_filled(chip, 4.0, egui::Color32::WHITE);
        painter.rect_stroke(
            chip,
            4.0,
            egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
            egui::StrokeKind::Inside,
        );
        painter.galley(chip.min + egui::vec2(4.0, 2.0), galley, egui::Color32::BLACK);
    }
}

pub(super) fn draw_students(
    painter: &egui::Painter,
    view: &View,
    students: &[Student],
    textures: &HashMap<StudentId, egui::TextureHandle>,
    dragged: Option<StudentId>,
) {
    for student in students {
        let r = view.rect_to_screen(student.bounds());
        painter.rect_filled(
            r.translate(egui::vec2(2.0, 2.0)),
            3.0,
            egui::Color32::from_black_alpha(30),
        );
        match textures.get(&student.id) {
            Some(texture) => {
                let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
                painter.image(texture.id(), r, uv, egui::Color32::WHITE);
            }
            None => {
                painter.rect_filled(r, 3.0, egui::Color32::from_gray(220));
            }
        }

        let (width, color) = if dragged == Some(student.id) {
            (3.0, DRAGGED_BORDER)
        } else {
            (1.0, STUDENT_BORDER)
        };
        painter.rect_stroke(
            r,
            3.0,
            egui::Stroke::new(width, color),
            egui::StrokeKind::Outside,
        );

        let band = egui::Rect::from_min_max(
            egui::pos2(r.min.x, r.max.y - NAME_BAND_HEIGHT),
            r.max,
        );
        painter.rect_filled(band, 0.0, egui::Color32::from_black_alpha(160));
        painter.with_clip_rect(band).text(
            band.center(),
            egui::Align2::CENTER_CENTER,
            &student.name,
            egui::FontId::proportional(11.0),
            egui::Color32::WHITE,
        );
    }
}

pub(super) fn draw_welcome(painter: &egui::Painter, rect: egui::Rect) {
    painter.text(
        rect.center() - egui::vec2(0.0, 14.0),
        egui::Align2::CENTER_CENTER,
        "Load student photos to start",
        egui::FontId::proportional(22.0),
        egui::Color32::from_gray(120),
    );
    painter.text(
        rect.center() + egui::vec2(0.0, 16.0),
        egui::Align2::CENTER_CENTER,
        "File > Load Photos (⌘L), or drop image files here",
        egui::FontId::proportional(14.0),
        egui::Color32::from_gray(140),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use classmap::{Point, Session};

    #[test]
    fn students_without_photos_get_placeholder_card() {
        let mut session = Session::default();
        session.add_student("Ana", None, Point::new(100, 120));
        let ctx = egui::Context::default();
        let output = ctx.run(egui::RawInput::default(), |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::background());
            draw_students(&painter, &View::default(), session.students(), &HashMap::new(), None);
        });
        // shadow, placeholder, border, name band and name
        assert!(output.shapes.len() >= 5);
    }
}
