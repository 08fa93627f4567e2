use chrono::Local;
use classmap::export::{self, ExportFormat};
use classmap::photos::{ImportLimits, SUPPORTED_EXTENSIONS};
use classmap::snapshot::{self, FILE_EXTENSION};
use classmap::{ArrangementStyle, ExportError, LayoutParams, OrganizeOutcome, StudentId};
use std::path::{Path, PathBuf};

use super::{ClassMapApp, PendingSnapshot, settings};

impl ClassMapApp {
    pub(super) fn params(&self) -> LayoutParams {
        LayoutParams::new(self.per_row, self.group_size)
    }

    fn limits(&self) -> ImportLimits {
        ImportLimits::new(self.max_photos, self.max_photo_mib)
    }

    pub(super) fn load_photos_dialog(&mut self) {
        if let Some(paths) = rfd::FileDialog::new()
            .set_title("Select student photos")
            .add_filter("Images", &SUPPORTED_EXTENSIONS)
            .pick_files()
        {
            self.load_photo_paths(&paths);
        }
    }

    pub(super) fn load_photo_paths(&mut self, paths: &[PathBuf]) {
        if paths.is_empty() {
            return;
        }
        self.drag.cancel();
        self.textures.clear();
        self.context_hit = None;
        let report = self.session.load_photos(paths, &self.limits());
        for skipped in &report.skipped {
            log::warn!("{skipped}");
        }
        self.status = Some(report.summary());
    }

    pub(super) fn organize(&mut self) {
        self.drag.cancel();
        match self.session.organize(self.style, self.params()) {
            OrganizeOutcome::NothingToArrange => {
                self.status = Some("No students to arrange. Load photos first.".to_string());
            }
            OrganizeOutcome::Arranged {
                style,
                students,
                groups,
            } => {
                self.status = Some(if groups > 0 {
                    format!("Arranged {students} students: {} ({groups} groups)", style.label())
                } else {
                    format!("Arranged {students} students: {}", style.label())
                });
            }
        }
    }

    pub(super) fn select_style(&mut self, style: ArrangementStyle) {
        if self.style != style {
            self.style = style;
            self.persist_settings();
        }
        self.status = Some(format!("Style: {}", style.label()));
    }

    pub(super) fn clear_groups(&mut self) {
        let removed = self.session.clear_groups();
        self.status = Some(if removed == 0 {
            "No groups to clear".to_string()
        } else {
            format!("Cleared {removed} groups")
        });
    }

    pub(super) fn reset(&mut self) {
        self.drag.cancel();
        self.session.reset();
        self.textures.clear();
        self.context_hit = None;
        self.pending_snapshot = None;
        self.status = Some("Map cleared".to_string());
        log::info!("session reset");
    }

    pub(super) fn remove_student(&mut self, id: StudentId) {
        self.drag.cancel();
        if let Some(student) = self.session.remove_student(id) {
            self.textures.remove(&id);
            self.status = Some(format!("Removed {}", student.name));
        }
    }

    pub(super) fn undo(&mut self) {
        self.drag.cancel();
        if self.session.undo() {
            self.status = Some("Undo".to_string());
        }
    }

    pub(super) fn redo(&mut self) {
        self.drag.cancel();
        if self.session.redo() {
            self.status = Some("Redo".to_string());
        }
    }

    pub(super) fn save_snapshot_to_path(&mut self) {
        let path = PathBuf::from(&self.snapshot_path);
        self.save_snapshot(&path);
    }

    pub(super) fn save_snapshot_dialog(&mut self) {
        let default_name = Path::new(&self.snapshot_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("class_map.{FILE_EXTENSION}"));
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(&default_name)
            .add_filter("Class map", &[FILE_EXTENSION])
            .save_file()
        {
            self.save_snapshot(&path);
            self.snapshot_path = path.display().to_string();
            self.persist_settings();
        }
    }

    fn save_snapshot(&mut self, path: &Path) {
        if self.session.is_empty() {
            self.status = Some("Nothing to save. Load photos first.".to_string());
            return;
        }
        match self.session.save_snapshot(path) {
            Ok(()) => self.status = Some(format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("saving {} failed: {e}", path.display());
                self.status = Some(format!("Save failed: {e}"));
            }
        }
    }

    pub(super) fn open_snapshot_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Class map", &[FILE_EXTENSION, "json"])
            .pick_file()
        {
            self.stage_snapshot(path);
        }
    }

    /// Reads the snapshot header so the user can confirm before anything on
    /// the map changes.
    pub(super) fn stage_snapshot(&mut self, path: PathBuf) {
        if self.session.is_empty() {
            self.status = Some("Load the class photos before loading a layout".to_string());
            return;
        }
        match snapshot::read_summary(&path) {
            Ok(summary) => self.pending_snapshot = Some(PendingSnapshot { path, summary }),
            Err(e) => {
                log::warn!("cannot read {}: {e}", path.display());
                self.status = Some(format!("Load failed: {e}"));
            }
        }
    }

    pub(super) fn confirm_pending_snapshot(&mut self) {
        let Some(pending) = self.pending_snapshot.take() else {
            return;
        };
        self.drag.cancel();
        match self.session.load_snapshot(&pending.path) {
            Ok(loaded) => {
                let placed = loaded
                    .students
                    .iter()
                    .filter(|r| self.session.student_by_name(&r.name).is_some())
                    .count();
                self.status = Some(format!(
                    "Loaded {}: {placed} of {} students placed, {} groups",
                    pending.summary.file_name,
                    loaded.students.len(),
                    self.session.groups().len()
                ));
                self.snapshot_path = pending.path.display().to_string();
                self.persist_settings();
            }
            Err(e) => {
                log::error!("loading {} failed: {e}", pending.path.display());
                self.status = Some(format!("Load failed: {e}"));
            }
        }
    }

    pub(super) fn export_dialog(&mut self) {
        let default_name = export::default_pdf_name(Local::now());
        if let Some(path) = rfd::FileDialog::new()
            .set_directory(self.export_directory())
            .set_file_name(&default_name)
            .add_filter("PDF", &["pdf"])
            .add_filter("Text", &["txt"])
            .add_filter("Class map", &[FILE_EXTENSION])
            .save_file()
        {
            self.export_to(&path);
        }
    }

    pub(super) fn quick_export_pdf(&mut self) {
        let path = self
            .export_directory()
            .join(export::default_pdf_name(Local::now()));
        self.export_to(&path);
    }

    fn export_to(&mut self, path: &Path) {
        match export::export_to_path(&self.session, path) {
            Ok(format) => {
                self.status = Some(format!("Exported {} to {}", format.label(), path.display()));
                if self.open_after_export && format != ExportFormat::Snapshot {
                    open_file(path);
                }
            }
            Err(ExportError::NothingToExport) => {
                self.status = Some("Nothing to export. Load photos first.".to_string());
            }
            Err(e) => self.status = Some(format!("Export failed: {e}")),
        }
    }

    pub(super) fn settings_snapshot(&self) -> settings::AppSettings {
        settings::AppSettings {
            snapshot_path: self.snapshot_path.clone(),
            export_dir: self.export_dir.clone(),
            default_style: self.style,
            per_row: self.per_row,
            group_size: self.group_size,
            max_photos: self.max_photos,
            max_photo_mib: self.max_photo_mib,
            open_after_export: self.open_after_export,
        }
    }

    pub(super) fn persist_settings(&mut self) {
        let snapshot = self.settings_snapshot();
        if let Err(e) = settings::save_settings(&self.settings_path, &snapshot) {
            self.status = Some(format!("Settings save failed: {e}"));
        }
    }
}

fn open_file(path: &Path) {
    let opener = if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(target_os = "windows") {
        "explorer"
    } else {
        "xdg-open"
    };
    if let Err(e) = std::process::Command::new(opener).arg(path).spawn() {
        log::warn!("could not open {}: {e}", path.display());
    }
}
