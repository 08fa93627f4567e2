use classmap::interaction::DragController;
use classmap::model::TOP_BAND;
use classmap::snapshot::SnapshotSummary;
use classmap::{ArrangementStyle, Point, Rect, Session, StudentId};
use eframe::egui;
use std::collections::HashMap;
use std::path::PathBuf;

mod actions;
mod command_palette;
mod help;
mod render;
mod settings;
mod update;

/// Maps canvas coordinates onto the central panel. The canvas band above
/// `TOP_BAND` is covered by the control panel, so canvas y = TOP_BAND sits at
/// the top edge of the drawing area.
#[derive(Clone, Copy, Debug)]
struct View {
    origin: egui::Pos2,
}

impl Default for View {
    fn default() -> Self {
        Self {
            origin: egui::Pos2::ZERO,
        }
    }
}

impl View {
    fn world_to_screen(&self, p: Point) -> egui::Pos2 {
        egui::pos2(
            self.origin.x + p.x as f32,
            self.origin.y + (p.y - TOP_BAND) as f32,
        )
    }

    fn screen_to_world(&self, screen: egui::Pos2) -> Point {
        Point::new(
            (screen.x - self.origin.x).round() as i32,
            (screen.y - self.origin.y).round() as i32 + TOP_BAND,
        )
    }

    fn rect_to_screen(&self, r: Rect) -> egui::Rect {
        egui::Rect::from_min_size(
            self.world_to_screen(Point::new(r.x, r.y)),
            egui::vec2(r.width as f32, r.height as f32),
        )
    }

    /// Canvas size covered by a drawing area of `size` pixels.
    fn canvas_size(size: egui::Vec2) -> (i32, i32) {
        (size.x as i32, size.y as i32 + TOP_BAND)
    }
}

/// A snapshot file picked by the user, waiting for confirmation.
struct PendingSnapshot {
    path: PathBuf,
    summary: SnapshotSummary,
}

pub struct ClassMapApp {
    session: Session,
    drag: DragController,
    view: View,
    style: ArrangementStyle,
    per_row: usize,
    group_size: usize,
    snapshot_path: String,
    export_dir: String,
    max_photos: usize,
    max_photo_mib: u64,
    open_after_export: bool,
    settings_path: String,
    status: Option<String>,
    textures: HashMap<StudentId, egui::TextureHandle>,
    pending_snapshot: Option<PendingSnapshot>,
    context_hit: Option<StudentId>,
    command_palette: command_palette::CommandPalette,
    show_help: bool,
}

impl ClassMapApp {
    fn config_path() -> Option<String> {
        if let Some(home) = std::env::var_os("HOME") {
            let path = PathBuf::from(home).join(".config").join("classmap.toml");
            if path.exists() {
                return Some(path.display().to_string());
            }
        }
        if std::path::Path::new("settings.toml").exists() {
            return Some("settings.toml".to_string());
        }
        None
    }

    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings_path = Self::config_path().unwrap_or_else(|| "settings.toml".to_string());
        let settings = settings::load_settings(&settings_path)
            .or_else(|| settings::load_settings("settings.json"))
            .unwrap_or_default();
        log::info!("settings from {settings_path}");

        Self {
            session: Session::default(),
            drag: DragController::default(),
            view: View::default(),
            style: settings.default_style,
            per_row: settings.per_row,
            group_size: settings.group_size,
            snapshot_path: settings.snapshot_path,
            export_dir: settings.export_dir,
            max_photos: settings.max_photos,
            max_photo_mib: settings.max_photo_mib,
            open_after_export: settings.open_after_export,
            settings_path,
            status: None,
            textures: HashMap::new(),
            pending_snapshot: None,
            context_hit: None,
            command_palette: command_palette::CommandPalette::default(),
            show_help: false,
        }
    }

    fn export_directory(&self) -> PathBuf {
        default_export_dir(&self.export_dir)
    }
}

/// Directory for quick exports: the configured one, else the desktop,
/// else the working directory.
fn default_export_dir(configured: &str) -> PathBuf {
    let configured = configured.trim();
    if !configured.is_empty() {
        return PathBuf::from(configured);
    }
    dirs::desktop_dir()
        .filter(|desktop| desktop.is_dir())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_round_trips_and_hides_band() {
        let view = View {
            origin: egui::pos2(10.0, 40.0),
        };
        let p = Point::new(120, 300);
        assert_eq!(view.screen_to_world(view.world_to_screen(p)), p);
        assert_eq!(
            view.world_to_screen(Point::new(0, TOP_BAND)),
            egui::pos2(10.0, 40.0)
        );
        assert_eq!(View::canvas_size(egui::vec2(800.0, 530.0)), (800, 600));
    }

    #[test]
    fn export_dir_prefers_configured_path() {
        assert_eq!(
            default_export_dir("  /tmp/maps  "),
            PathBuf::from("/tmp/maps")
        );
        let fallback = default_export_dir(" ");
        assert!(fallback == PathBuf::from(".") || fallback.is_dir());
        if let Some(desktop) = dirs::desktop_dir().filter(|d| d.is_dir()) {
            assert_eq!(fallback, desktop);
        }
    }
}
