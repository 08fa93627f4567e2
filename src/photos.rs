use crate::error::PhotoError;
use crate::model::{Canvas, Point, STUDENT_HEIGHT, STUDENT_WIDTH};
use image::error::LimitErrorKind;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageReader, Limits, RgbaImage};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "gif"];

const MIB: u64 = 1024 * 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_photos: usize,
    pub max_bytes: u64,
    /// Decoder allocation ceiling per image.
    pub max_alloc: u64,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_photos: 100,
            max_bytes: 10 * MIB,
            max_alloc: 512 * MIB,
        }
    }
}

impl ImportLimits {
    pub fn new(max_photos: usize, max_photo_mib: u64) -> Self {
        Self {
            max_photos: max_photos.max(1),
            max_bytes: max_photo_mib.max(1) * MIB,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
pub struct LoadedPhoto {
    pub name: String,
    pub image: RgbaImage,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub loaded: usize,
    pub skipped: Vec<PhotoError>,
    /// Files beyond `max_photos` that were never looked at.
    pub truncated: usize,
    /// Set when the decoder ran out of memory and the rest of the batch was
    /// abandoned.
    pub aborted: bool,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        let mut msg = format!("Loaded {} students", self.loaded);
        if !self.skipped.is_empty() {
            msg.push_str(&format!(", {} files skipped", self.skipped.len()));
        }
        if self.truncated > 0 {
            msg.push_str(&format!(", {} over the limit ignored", self.truncated));
        }
        if self.aborted {
            msg.push_str(", stopped: out of memory");
        }
        msg
    }
}

pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&e.as_str())
        })
        .unwrap_or(false)
}

/// Top-left corner for the `index`-th photo of a fresh batch.
pub fn initial_position(index: usize, canvas: &Canvas) -> Point {
    let max_x = canvas.width - 150;
    let (mut x, mut y) = (50, 90);
    for _ in 0..index {
        x += 90;
        if x > max_x {
            x = 50;
            y += 120;
        }
    }
    Point::new(x, y)
}

pub fn load_batch(paths: &[PathBuf], limits: &ImportLimits) -> (Vec<LoadedPhoto>, ImportReport) {
    let mut report = ImportReport {
        truncated: paths.len().saturating_sub(limits.max_photos),
        ..ImportReport::default()
    };
    let mut loaded = Vec::new();
    let mut names = HashSet::new();

    for path in paths.iter().take(limits.max_photos) {
        match load_photo(path, limits) {
            Ok(photo) => {
                if !names.insert(photo.name.clone()) {
                    log::warn!("skipping {}: duplicate name", path.display());
                    report.skipped.push(PhotoError::DuplicateName(photo.name));
                    continue;
                }
                loaded.push(photo);
            }
            Err(PhotoError::OutOfMemory(path)) => {
                log::error!("out of memory loading {}, stopping batch", path.display());
                report.skipped.push(PhotoError::OutOfMemory(path));
                report.aborted = true;
                break;
            }
            Err(e) => {
                log::warn!("skipping {}: {e}", path.display());
                report.skipped.push(e);
            }
        }
    }
    report.loaded = loaded.len();
    (loaded, report)
}

pub fn load_photo(path: &Path, limits: &ImportLimits) -> Result<LoadedPhoto, PhotoError> {
    let meta = std::fs::metadata(path).map_err(|source| PhotoError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if meta.len() > limits.max_bytes {
        return Err(PhotoError::TooLarge {
            path: path.to_path_buf(),
            bytes: meta.len(),
            limit: limits.max_bytes,
        });
    }
    if !is_supported(path) {
        return Err(PhotoError::UnsupportedFormat(path.to_path_buf()));
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let image = decode(path, limits)?;
    Ok(LoadedPhoto {
        name,
        image: fit_to_student(&image),
    })
}

fn decode(path: &Path, limits: &ImportLimits) -> Result<DynamicImage, PhotoError> {
    let mut reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|source| PhotoError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
    let mut decode_limits = Limits::default();
    decode_limits.max_alloc = Some(limits.max_alloc);
    reader.limits(decode_limits);

    reader.decode().map_err(|e| match e {
        ImageError::Limits(ref l) if matches!(l.kind(), LimitErrorKind::InsufficientMemory) => {
            PhotoError::OutOfMemory(path.to_path_buf())
        }
        other => PhotoError::Decode {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    })
}

/// Scales a decoded photo to the student card size. The original is dropped
/// by the caller as soon as this returns.
pub fn fit_to_student(image: &DynamicImage) -> RgbaImage {
    image
        .resize_exact(
            STUDENT_WIDTH as u32,
            STUDENT_HEIGHT as u32,
            FilterType::CatmullRom,
        )
        .to_rgba8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba([200, 40, 40, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(is_supported(Path::new("a/Ana.JPG")));
        assert!(is_supported(Path::new("b.gif")));
        assert!(!is_supported(Path::new("c.tiff")));
        assert!(!is_supported(Path::new("noext")));
    }

    #[test]
    fn placement_wraps_near_right_edge() {
        let canvas = Canvas::new(400, 600);
        // max x is 250: 50, 140, 230 fit, the next wraps
        assert_eq!(initial_position(0, &canvas), Point::new(50, 90));
        assert_eq!(initial_position(2, &canvas), Point::new(230, 90));
        assert_eq!(initial_position(3, &canvas), Point::new(50, 210));
        assert_eq!(initial_position(4, &canvas), Point::new(140, 210));
    }

    #[test]
    fn photos_are_resized_to_card() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "Bea.png", 300, 200);
        let photo = load_photo(&path, &ImportLimits::default()).unwrap();
        assert_eq!(photo.name, "Bea");
        assert_eq!(photo.image.dimensions(), (80, 100));
    }

    #[test]
    fn batch_skips_bad_files_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "Ana.png", 10, 10);
        let sub = dir.path().join("other");
        std::fs::create_dir(&sub).unwrap();
        let dup = write_png(&sub, "Ana.png", 10, 10);
        let text = dir.path().join("notes.txt");
        std::fs::write(&text, "hello").unwrap();
        let broken = dir.path().join("broken.png");
        std::fs::write(&broken, b"not an image").unwrap();
        let missing = dir.path().join("ghost.png");

        let (loaded, report) =
            load_batch(&[a, dup, text, broken, missing], &ImportLimits::default());
        assert_eq!(loaded.len(), 1);
        assert_eq!(report.loaded, 1);
        assert_eq!(report.skipped.len(), 4);
        assert!(matches!(report.skipped[0], PhotoError::DuplicateName(_)));
        assert!(matches!(report.skipped[1], PhotoError::UnsupportedFormat(_)));
        assert!(matches!(report.skipped[2], PhotoError::Decode { .. }));
        assert!(matches!(report.skipped[3], PhotoError::Unreadable { .. }));
        assert!(!report.aborted);
    }

    #[test]
    fn batch_over_limit_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..4)
            .map(|i| write_png(dir.path(), &format!("s{i}.png"), 4, 4))
            .collect();
        let limits = ImportLimits {
            max_photos: 3,
            ..ImportLimits::default()
        };
        let (loaded, report) = load_batch(&paths, &limits);
        assert_eq!(loaded.len(), 3);
        assert_eq!(report.truncated, 1);
    }

    #[test]
    fn out_of_memory_stops_batch_but_keeps_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![
            write_png(dir.path(), "Ana.png", 10, 10),
            write_png(dir.path(), "Bo.png", 200, 200),
            write_png(dir.path(), "Cy.png", 200, 200),
        ];
        let limits = ImportLimits {
            max_alloc: 20_000,
            ..ImportLimits::default()
        };
        let (loaded, report) = load_batch(&paths, &limits);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Ana");
        assert!(report.aborted);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0], PhotoError::OutOfMemory(_)));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "big.png", 64, 64);
        let limits = ImportLimits {
            max_bytes: 10,
            ..ImportLimits::default()
        };
        assert!(matches!(
            load_photo(&path, &limits),
            Err(PhotoError::TooLarge { .. })
        ));
    }
}
