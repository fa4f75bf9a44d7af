//! Picture storage seam between the classifier and an image writer.

use crate::error::Result;
use crate::image_hints::CropBox;

/// A picture the classifier wants stored.
#[derive(Debug, Clone, Copy)]
pub struct PictureRequest<'a> {
    /// Deck file stem, used as the image name prefix.
    pub stem: &'a str,
    /// 1-based slide number.
    pub slide: usize,
    pub shape_id: u32,
    /// Archive path of the media part.
    pub media: &'a str,
    pub data: &'a [u8],
    pub crop: CropBox,
}

impl PictureRequest<'_> {
    /// Extension of the media part, lowercased.
    pub fn extension(&self) -> String {
        self.media
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default()
    }

    /// Deterministic file name for the picture, `<stem>_<slide>_<shape>.<ext>`.
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}_{}_{}.{}", self.stem, self.slide, self.shape_id, extension)
    }
}

/// Result of storing one picture.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPicture {
    /// Path relative to the output document.
    pub path: String,
    /// Pixel size after cropping, when the bitmap was decoded.
    pub pixel_size: Option<(u32, u32)>,
    /// Whether the crop was applied to the written bitmap.
    pub crop_applied: bool,
}

/// Writes pictures and reports where they went.
pub trait ImageStore {
    fn store(&mut self, request: &PictureRequest<'_>) -> Result<StoredPicture>;
}

/// Store used when image extraction is disabled: nothing is written.
#[derive(Debug, Default)]
pub struct NoImages;

impl ImageStore for NoImages {
    fn store(&mut self, request: &PictureRequest<'_>) -> Result<StoredPicture> {
        Err(crate::Error::ImageError(format!(
            "image extraction disabled for {}",
            request.media
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_file_name() {
        let request = PictureRequest {
            stem: "deck",
            slide: 3,
            shape_id: 7,
            media: "ppt/media/image2.PNG",
            data: &[],
            crop: CropBox::default(),
        };
        assert_eq!(request.extension(), "png");
        assert_eq!(request.file_name("png"), "deck_3_7.png");
    }
}
