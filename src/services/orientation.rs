use crate::models::UploadedFile;
use exif::{In, Reader, Tag};
use image::{DynamicImage, ImageFormat, ImageOutputFormat};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Classified outcome of an EXIF rotation attempt.
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("Could not read file: {0}")]
    ReadFile(String),
    #[error("Could not read EXIF data: {0}")]
    ReadExif(String),
    #[error("No orientation tag found in EXIF")]
    NoOrientation,
    #[error("Unknown orientation value: {0}")]
    UnknownOrientation(u32),
    #[error("Orientation already correct")]
    CorrectOrientation,
    #[error("Could not rotate image: {0}")]
    RotateFile(String),
}

impl RotationError {
    pub fn code(&self) -> &'static str {
        match self {
            RotationError::ReadFile(_) => "read_file",
            RotationError::ReadExif(_) => "read_exif",
            RotationError::NoOrientation => "no_orientation",
            RotationError::UnknownOrientation(_) => "unknown_orientation",
            RotationError::CorrectOrientation => "correct_orientation",
            RotationError::RotateFile(_) => "rotate_file",
        }
    }

    /// Errors meaning "nothing to do": the image is left as uploaded.
    pub fn is_acceptable(&self) -> bool {
        matches!(
            self,
            RotationError::ReadExif(_)
                | RotationError::NoOrientation
                | RotationError::CorrectOrientation
        )
    }
}

/// Rotation collaborator: reads an image from disk and returns the
/// orientation-corrected bytes, without touching the file.
pub trait ImageRotator: Send + Sync {
    fn rotate(&self, path: &Path) -> Result<Vec<u8>, RotationError>;
}

/// A rejected rotation, attributed to a single uploaded file.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("image rotation failed for {filename}: {}", .message.as_deref().unwrap_or("unknown error"))]
pub struct RotationFailure {
    pub filename: String,
    pub error_code: Option<String>,
    pub message: Option<String>,
}

impl RotationFailure {
    fn new(file: &UploadedFile, error_code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            filename: file.filename.clone(),
            error_code: error_code.map(str::to_string),
            message: Some(message.into()),
        }
    }
}

/// Applies EXIF orientation to an uploaded image in place.
///
/// The file must be accessible. Acceptable rotation errors leave the file
/// untouched and resolve; any other error, a rotation exceeding `timeout`,
/// or a failed write rejects with the offending file's code and message.
pub async fn rotate_image_from_exif(
    rotator: Arc<dyn ImageRotator>,
    file: &UploadedFile,
    timeout: Duration,
) -> Result<(), RotationFailure> {
    if let Err(e) = tokio::fs::metadata(&file.path).await {
        tracing::warn!(
            "Uploaded file {} is not accessible: {}",
            file.path.display(),
            e
        );
        return Err(RotationFailure {
            filename: file.filename.clone(),
            error_code: None,
            message: Some(format!("Uploaded file {} is not accessible.", file.filename)),
        });
    }

    let path = file.path.clone();
    let task = tokio::task::spawn_blocking(move || rotator.rotate(&path));

    let outcome = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_error)) => {
            tracing::error!("Rotation task for {} panicked: {}", file.filename, join_error);
            return Err(RotationFailure::new(
                file,
                Some("rotate_file"),
                "Image rotation stopped unexpectedly.",
            ));
        }
        Err(_) => {
            tracing::warn!(
                "Image rotation for {} exceeded {:?}",
                file.filename,
                timeout
            );
            return Err(RotationFailure::new(
                file,
                Some("timeout"),
                format!("Image rotation timed out after {} seconds.", timeout.as_secs()),
            ));
        }
    };

    match outcome {
        Ok(corrected) => {
            tokio::fs::write(&file.path, corrected).await.map_err(|e| {
                tracing::error!("Failed to write rotated image {}: {}", file.path.display(), e);
                RotationFailure::new(file, Some("rotate_file"), "Could not save rotated image.")
            })?;
            tracing::info!("Rotated {} from EXIF orientation", file.filename);
            Ok(())
        }
        Err(e) if e.is_acceptable() => {
            tracing::debug!("No rotation applied to {}: {}", file.filename, e);
            Ok(())
        }
        Err(e) => {
            tracing::warn!("Image rotation failed for file {}: {}", file.path.display(), e);
            Err(RotationFailure::new(file, Some(e.code()), e.to_string()))
        }
    }
}

/// JPEG autorotation backed by `kamadak-exif` for tag reading and `image`
/// for pixel transforms. The corrected image is re-encoded without EXIF, so
/// viewers will not apply the orientation a second time.
pub struct ExifRotator {
    jpeg_quality: u8,
}

impl Default for ExifRotator {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ExifRotator {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    pub fn rotate_bytes(&self, data: &[u8]) -> Result<Vec<u8>, RotationError> {
        if image::guess_format(data).ok() != Some(ImageFormat::Jpeg) {
            return Err(RotationError::ReadExif("Given data isn't JPEG.".to_string()));
        }

        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(data))
            .map_err(|e| RotationError::ReadExif(e.to_string()))?;

        let orientation = exif
            .get_field(Tag::Orientation, In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .ok_or(RotationError::NoOrientation)?;

        if orientation == 1 {
            return Err(RotationError::CorrectOrientation);
        }
        if !(2..=8).contains(&orientation) {
            return Err(RotationError::UnknownOrientation(orientation));
        }

        let img = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
            .map_err(|e| RotationError::RotateFile(e.to_string()))?;
        let corrected = apply_orientation(img, orientation);

        let mut buffer = Vec::new();
        corrected
            .write_to(
                &mut Cursor::new(&mut buffer),
                ImageOutputFormat::Jpeg(self.jpeg_quality),
            )
            .map_err(|e| RotationError::RotateFile(e.to_string()))?;

        Ok(buffer)
    }
}

impl ImageRotator for ExifRotator {
    fn rotate(&self, path: &Path) -> Result<Vec<u8>, RotationError> {
        let data = std::fs::read(path).map_err(|e| RotationError::ReadFile(e.to_string()))?;
        self.rotate_bytes(&data)
    }
}

/// Maps an EXIF orientation (2..=8) onto the transform that displays the
/// image upright.
fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate90().flipv(),
        8 => img.rotate270(),
        _ => img,
    }
}
