use classmap::ArrangementStyle;
use serde::{Deserialize, Serialize};

pub(super) const PER_ROW_RANGE: std::ops::RangeInclusive<usize> = 2..=8;
pub(super) const GROUP_SIZE_RANGE: std::ops::RangeInclusive<usize> = 2..=8;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct AppSettings {
    pub snapshot_path: String,
    /// Where quick PDF exports go. Empty means the desktop directory.
    pub export_dir: String,
    pub default_style: ArrangementStyle,
    pub per_row: usize,
    pub group_size: usize,
    pub max_photos: usize,
    pub max_photo_mib: u64,
    pub open_after_export: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            snapshot_path: "class_map.classmap".to_string(),
            export_dir: String::new(),
            default_style: ArrangementStyle::Rows,
            per_row: 4,
            group_size: 2,
            max_photos: 100,
            max_photo_mib: 10,
            open_after_export: false,
        }
    }
}

impl AppSettings {
    /// Pulls hand-edited values back into the ranges the controls offer.
    pub fn clamped(mut self) -> Self {
        self.per_row = self.per_row.clamp(*PER_ROW_RANGE.start(), *PER_ROW_RANGE.end());
        self.group_size = self
            .group_size
            .clamp(*GROUP_SIZE_RANGE.start(), *GROUP_SIZE_RANGE.end());
        self.max_photos = self.max_photos.max(1);
        self.max_photo_mib = self.max_photo_mib.max(1);
        self
    }
}

pub(super) fn load_settings(path: &str) -> Option<AppSettings> {
    let s = std::fs::read_to_string(path).ok()?;
    let settings = if path.ends_with(".toml") {
        toml::from_str::<AppSettings>(&s)
            .ok()
            .or_else(|| serde_json::from_str::<AppSettings>(&s).ok())
    } else {
        serde_json::from_str::<AppSettings>(&s)
            .ok()
            .or_else(|| toml::from_str::<AppSettings>(&s).ok())
    };
    if settings.is_none() {
        log::warn!("ignoring unreadable settings file {path}");
    }
    settings.map(AppSettings::clamped)
}

pub(super) fn save_settings(path: &str, settings: &AppSettings) -> Result<(), String> {
    if path.ends_with(".toml") {
        let toml = toml::to_string_pretty(settings).map_err(|e| e.to_string())?;
        std::fs::write(path, toml).map_err(|e| e.to_string())
    } else {
        let json = serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| e.to_string())
    }
}
