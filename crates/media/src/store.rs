//! Writes pictures into an image directory.

use crate::convert::{is_unsupported, CommandConverter, ImageConverter};
use deck_core::image_hints::CropBox;
use deck_core::{Error, ImageStore, PictureRequest, Result, StoredPicture};
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// A picture ready to be written.
struct Prepared {
    bytes: Vec<u8>,
    extension: String,
    pixel_size: Option<(u32, u32)>,
    crop_applied: bool,
}

/// [`ImageStore`] writing one file per picture into a directory.
///
/// Unsupported vector formats are converted first, then the bitmap is
/// cropped. Anything that cannot be decoded is written unchanged.
pub struct DirImageStore {
    image_dir: PathBuf,
    /// Directory the rendered documents live in; stored paths are relative
    /// to it when the image directory is below it.
    link_base: PathBuf,
    convert_unsupported: bool,
    converter: Box<dyn ImageConverter + Send + Sync>,
}

impl DirImageStore {
    pub fn new(image_dir: impl Into<PathBuf>, link_base: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            link_base: link_base.into(),
            convert_unsupported: true,
            converter: Box::new(CommandConverter::default()),
        }
    }

    /// Enable or disable conversion of WMF/EMF pictures.
    pub fn with_conversion(mut self, enabled: bool) -> Self {
        self.convert_unsupported = enabled;
        self
    }

    pub fn with_converter(mut self, converter: impl ImageConverter + Send + Sync + 'static) -> Self {
        self.converter = Box::new(converter);
        self
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    fn prepare(&self, request: &PictureRequest<'_>) -> Prepared {
        let extension = request.extension();
        let raw = || Prepared {
            bytes: request.data.to_vec(),
            extension: request.extension(),
            pixel_size: None,
            crop_applied: false,
        };

        let (bytes, extension) = if is_unsupported(&extension) {
            if !self.convert_unsupported {
                return raw();
            }
            match self.converter.to_png(request.data, &extension) {
                Ok(png) => (png, "png".to_string()),
                Err(e) => {
                    log::warn!(
                        "Keeping {} picture of slide {} unconverted: {}",
                        extension,
                        request.slide,
                        e
                    );
                    return raw();
                }
            }
        } else {
            (request.data.to_vec(), extension)
        };

        let decoded = match image::load_from_memory(&bytes) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!(
                    "Cannot decode picture {} of slide {}, writing it unchanged: {}",
                    request.media,
                    request.slide,
                    e
                );
                return Prepared {
                    bytes,
                    extension,
                    pixel_size: None,
                    crop_applied: false,
                };
            }
        };

        let size = (decoded.width(), decoded.height());
        if request.crop.is_empty() {
            return Prepared {
                bytes,
                extension,
                pixel_size: Some(size),
                crop_applied: false,
            };
        }

        let Some(cropped) = crop(&decoded, &request.crop) else {
            log::warn!(
                "Invalid crop rectangle for picture {} of slide {}, keeping it uncropped",
                request.shape_id,
                request.slide
            );
            return Prepared {
                bytes,
                extension,
                pixel_size: Some(size),
                crop_applied: false,
            };
        };

        match encode(&cropped, &extension) {
            Ok((bytes, extension)) => Prepared {
                bytes,
                extension,
                pixel_size: Some((cropped.width(), cropped.height())),
                crop_applied: true,
            },
            Err(e) => {
                log::warn!("Cannot re-encode cropped picture: {}", e);
                Prepared {
                    bytes,
                    extension,
                    pixel_size: Some(size),
                    crop_applied: false,
                }
            }
        }
    }

    /// Path as written into documents, with forward slashes.
    fn link_path(&self, file: &Path) -> String {
        let relative = file.strip_prefix(&self.link_base).unwrap_or(file);
        relative.to_string_lossy().replace('\\', "/")
    }
}

impl ImageStore for DirImageStore {
    fn store(&mut self, request: &PictureRequest<'_>) -> Result<StoredPicture> {
        let prepared = self.prepare(request);
        fs::create_dir_all(&self.image_dir)?;
        let file = self.image_dir.join(request.file_name(&prepared.extension));
        fs::write(&file, &prepared.bytes)?;
        log::debug!("Wrote {}", file.display());

        Ok(StoredPicture {
            path: self.link_path(&file),
            pixel_size: prepared.pixel_size,
            crop_applied: prepared.crop_applied,
        })
    }
}

fn crop(image: &DynamicImage, crop: &CropBox) -> Option<DynamicImage> {
    let (x, y, width, height) = crop.pixel_rect(image.width(), image.height())?;
    Some(image.crop_imm(x, y, width, height))
}

/// Encode in the picture's own format where possible, PNG otherwise.
fn encode(image: &DynamicImage, extension: &str) -> Result<(Vec<u8>, String)> {
    let format = match ImageFormat::from_extension(extension) {
        Some(format @ (ImageFormat::Png | ImageFormat::Gif | ImageFormat::Bmp | ImageFormat::Tiff)) => {
            format
        }
        Some(ImageFormat::Jpeg) => {
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            return write(&rgb, ImageFormat::Jpeg).map(|bytes| (bytes, extension.to_string()));
        }
        _ => ImageFormat::Png,
    };
    let extension = if format == ImageFormat::Png {
        "png".to_string()
    } else {
        extension.to_string()
    };
    write(image, format).map(|bytes| (bytes, extension))
}

fn write(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .map_err(|e| Error::ImageError(format!("Failed to encode {:?}: {}", format, e)))?;
    Ok(buffer.into_inner())
}
