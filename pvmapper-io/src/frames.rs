//! Detection patches and radiometric TIFF frames.
//!
//! Patch files are named `<frame_name>_<mask_name>.<ext>` where the frame
//! name is the 12-character `frame_NNNNNN` of the source frame the patch was
//! cropped from, e.g. `frame_000123_mask_000004.tiff`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use pvmapper_core::{Error as CoreError, PatchKey, RadiometricFrame};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::ColorType;

use crate::{DatasetLayout, Error, Result};

const FRAME_NAME_LEN: usize = 12;

/// One detection patch of a module, parsed from its filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchFile {
    /// Path of the patch image.
    pub path: PathBuf,
    /// Index of the full source frame the patch was cropped from.
    pub frame_index: u32,
    /// Key of the patch's quadrilateral in the patch metadata.
    pub key: PatchKey,
}

impl PatchFile {
    /// Parses a patch filename.
    ///
    /// # Errors
    /// Returns `MalformedData` if the name does not embed a frame index or
    /// cannot be split into frame and mask names.
    pub fn parse(track_id: &str, path: &Path) -> std::result::Result<Self, CoreError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CoreError::MalformedData(format!("patch path {}", path.display())))?;
        let frame_index = frame_index_from_name(file_name).ok_or_else(|| {
            CoreError::MalformedData(format!("no frame index in patch name {file_name:?}"))
        })?;

        let stem = file_name.split('.').next().unwrap_or(file_name);
        let (Some(frame_name), Some(mask_name)) =
            (stem.get(..FRAME_NAME_LEN), stem.get(FRAME_NAME_LEN + 1..))
        else {
            return Err(CoreError::MalformedData(format!(
                "patch name {file_name:?} is not <frame>_<mask>"
            )));
        };
        if mask_name.is_empty() {
            return Err(CoreError::MalformedData(format!(
                "patch name {file_name:?} has no mask name"
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            frame_index,
            key: PatchKey::new(track_id, frame_name, mask_name),
        })
    }
}

/// Returns the first run of decimal digits in `name`.
#[must_use]
pub fn frame_index_from_name(name: &str) -> Option<u32> {
    let start = name.find(|c: char| c.is_ascii_digit())?;
    let digits = &name[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// Patch image files of a module, sorted by filename.
///
/// # Errors
/// Returns `NotFound` if the module has no patch directory.
pub fn list_patch_files(layout: &DatasetLayout, track_id: &str) -> Result<Vec<PathBuf>> {
    if track_id.is_empty() || track_id.contains(['/', '\\']) || track_id.starts_with('.') {
        return Err(Error::Core(CoreError::NotFound(format!(
            "patches of track {track_id:?}"
        ))));
    }
    let dir = layout.patch_dir(track_id);
    let entries = std::fs::read_dir(&dir).map_err(|e| Error::at_path(e, &dir))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Reads a single-channel radiometric TIFF.
///
/// # Errors
/// Returns `NotFound` if the file is missing and an error if it is not an
/// 8- or 16-bit grayscale image.
pub fn read_radiometric(path: &Path) -> Result<RadiometricFrame> {
    let file = File::open(path).map_err(|e| Error::at_path(e, path))?;
    let mut decoder = Decoder::new(BufReader::new(file))?;
    let (width, height) = decoder.dimensions()?;
    let color = decoder.colortype()?;
    if !matches!(color, ColorType::Gray(8 | 16)) {
        return Err(Error::Core(CoreError::MalformedData(format!(
            "{}: expected 8/16-bit grayscale, got {color:?}",
            path.display()
        ))));
    }

    let data = match decoder.read_image()? {
        DecodingResult::U16(data) => data,
        DecodingResult::U8(data) => data.into_iter().map(u16::from).collect(),
        _ => {
            return Err(Error::Core(CoreError::MalformedData(format!(
                "{}: unsupported sample format",
                path.display()
            ))))
        }
    };
    Ok(RadiometricFrame::new(width as usize, height as usize, data)?)
}

/// Writes a 16-bit single-channel radiometric TIFF.
///
/// # Errors
/// Returns an error if the file cannot be created or encoded.
pub fn write_radiometric(path: &Path, frame: &RadiometricFrame) -> Result<()> {
    let width = u32::try_from(frame.width())
        .map_err(|_| Error::Core(CoreError::MalformedData("frame too wide".to_string())))?;
    let height = u32::try_from(frame.height())
        .map_err(|_| Error::Core(CoreError::MalformedData("frame too tall".to_string())))?;
    let file = File::create(path)?;
    let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
    encoder.write_image::<colortype::Gray16>(width, height, frame.raw())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_patch_name() {
        let patch =
            PatchFile::parse("T1", Path::new("/d/frame_000123_mask_000004.tiff")).unwrap();
        assert_eq!(patch.frame_index, 123);
        assert_eq!(patch.key, PatchKey::new("T1", "frame_000123", "mask_000004"));
    }

    #[test]
    fn test_parse_rejects_bad_names() {
        assert!(PatchFile::parse("T1", Path::new("patch.tiff")).is_err());
        assert!(PatchFile::parse("T1", Path::new("frame_000123.tiff")).is_err());
        assert!(PatchFile::parse("T1", Path::new("frame_000123_.tiff")).is_err());
    }

    #[test]
    fn test_frame_index_from_name() {
        assert_eq!(frame_index_from_name("frame_000042_mask_000001.png"), Some(42));
        assert_eq!(frame_index_from_name("7.tiff"), Some(7));
        assert_eq!(frame_index_from_name("none.tiff"), None);
    }

    #[test]
    fn test_list_patch_files_sorted() {
        let dir = TempDir::new().unwrap();
        let layout = DatasetLayout::new(dir.path());
        let patch_dir = layout.patch_dir("T1");
        std::fs::create_dir_all(&patch_dir).unwrap();
        for name in ["frame_000020_mask_000000.tiff", "frame_000003_mask_000001.tiff"] {
            std::fs::write(patch_dir.join(name), b"").unwrap();
        }
        std::fs::create_dir(patch_dir.join("nested")).unwrap();

        let files = list_patch_files(&layout, "T1").unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("frame_000003_mask_000001.tiff"));

        let err = CoreError::from(list_patch_files(&layout, "T9").unwrap_err());
        assert!(err.is_not_found());
        assert!(list_patch_files(&layout, "../T1").is_err());
    }

    #[test]
    fn test_tiff_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("frame_000001.tiff");
        let frame = RadiometricFrame::new(3, 2, vec![7000, 7100, 7200, 7300, 7400, u16::MAX]).unwrap();
        write_radiometric(&path, &frame).unwrap();
        assert_eq!(read_radiometric(&path).unwrap(), frame);
    }

    #[test]
    fn test_missing_frame_is_not_found() {
        let err = read_radiometric(Path::new("/nonexistent/frame_000001.tiff")).unwrap_err();
        assert!(CoreError::from(err).is_not_found());
    }
}
