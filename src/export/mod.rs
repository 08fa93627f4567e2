use crate::error::ExportError;
use crate::session::Session;
use chrono::{DateTime, Local};
use std::path::Path;

pub mod pdf;
pub mod raster;
pub mod text;

pub use pdf::{build_pdf, write_pdf};
pub use raster::{MapRaster, render_map};
pub use text::{render_text, write_text};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Text,
    Snapshot,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "txt" => Ok(ExportFormat::Text),
            "classmap" | "json" => Ok(ExportFormat::Snapshot),
            _ => Err(ExportError::UnsupportedFormat(ext)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "PDF",
            ExportFormat::Text => "text",
            ExportFormat::Snapshot => "class map",
        }
    }
}

/// Writes the session to `path` in the format named by its extension.
pub fn export_to_path(session: &Session, path: &Path) -> Result<ExportFormat, ExportError> {
    let format = ExportFormat::from_path(path)?;
    if session.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    let result = match format {
        ExportFormat::Pdf => write_pdf(session, path),
        ExportFormat::Text => write_text(session, path),
        ExportFormat::Snapshot => session.save_snapshot(path).map_err(ExportError::from),
    };
    match &result {
        Ok(()) => log::info!("exported {} to {}", format.label(), path.display()),
        Err(e) => log::error!("{} export to {} failed: {e}", format.label(), path.display()),
    }
    result.map(|()| format)
}

/// File name for a quick PDF export made at `now`.
pub fn default_pdf_name(now: DateTime<Local>) -> String {
    format!("Class_Map_{}.pdf", now.format("%Y%m%d_%H%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    #[test]
    fn format_follows_extension() {
        let f = |p: &str| ExportFormat::from_path(&PathBuf::from(p));
        assert_eq!(f("map.PDF").unwrap(), ExportFormat::Pdf);
        assert_eq!(f("map.txt").unwrap(), ExportFormat::Text);
        assert_eq!(f("map.classmap").unwrap(), ExportFormat::Snapshot);
        assert_eq!(f("map.json").unwrap(), ExportFormat::Snapshot);
        assert!(matches!(f("map.docx"), Err(ExportError::UnsupportedFormat(e)) if e == "docx"));
        assert!(matches!(f("map"), Err(ExportError::UnsupportedFormat(_))));
    }

    #[test]
    fn empty_session_is_not_exported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        assert!(matches!(
            export_to_path(&Session::default(), &path),
            Err(ExportError::NothingToExport)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn quick_export_name_has_timestamp() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(default_pdf_name(now), "Class_Map_20240309_1405.pdf");
    }
}
