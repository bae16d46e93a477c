//! Embedded image parts

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use super::SerializationError;
use crate::layout::{BlockKind, LayoutBlock};
use crate::styles::StyleCatalog;

#[derive(Debug, Clone)]
pub struct EmbeddedImage<'a> {
    /// Caption number of the owning figure
    pub number: u32,
    pub extension: &'static str,
    pub content_type: &'static str,
    /// Drawing extent in EMU
    pub cx: u64,
    pub cy: u64,
    pub bytes: &'a [u8],
}

impl EmbeddedImage<'_> {
    pub fn rel_id(&self) -> String {
        format!("rIdImage{}", self.number)
    }

    /// Target relative to `word/`
    pub fn target(&self) -> String {
        format!("media/image{}.{}", self.number, self.extension)
    }
}

fn encoding(format: ImageFormat) -> Option<(&'static str, &'static str)> {
    match format {
        ImageFormat::Png => Some(("png", "image/png")),
        ImageFormat::Jpeg => Some(("jpeg", "image/jpeg")),
        ImageFormat::Gif => Some(("gif", "image/gif")),
        ImageFormat::Bmp => Some(("bmp", "image/bmp")),
        _ => None,
    }
}

/// Sniff the encoding and size the drawing to the catalog figure width.
pub fn probe<'a>(
    number: u32,
    bytes: &'a [u8],
    catalog: &StyleCatalog,
) -> Result<EmbeddedImage<'a>, SerializationError> {
    let format = image::guess_format(bytes).map_err(|_| SerializationError::UnsupportedImage {
        figure: number,
        format: "unknown".to_string(),
    })?;

    let (extension, content_type) = encoding(format).ok_or_else(|| {
        SerializationError::UnsupportedImage {
            figure: number,
            format: format!("{:?}", format).to_lowercase(),
        }
    })?;

    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|source| SerializationError::ImageDecode { figure: number, source })?;

    if width == 0 || height == 0 {
        return Err(SerializationError::UnsupportedImage {
            figure: number,
            format: format!("{}x{} {}", width, height, extension),
        });
    }

    let cx = catalog.figure_width();
    let cy = cx * height as u64 / width as u64;

    Ok(EmbeddedImage { number, extension, content_type, cx, cy, bytes })
}

/// One embedded image per figure block, in block order.
pub fn collect<'a>(
    blocks: &[LayoutBlock],
    images: &'a [Vec<u8>],
    catalog: &StyleCatalog,
) -> Result<Vec<EmbeddedImage<'a>>, SerializationError> {
    blocks.iter()
        .filter_map(|b| match b.kind {
            BlockKind::Figure { number, image, .. } => Some((number, image)),
            _ => None,
        })
        .map(|(number, image)| {
            let bytes = images.get(image).ok_or(SerializationError::MissingImage {
                figure: number,
                image,
                available: images.len(),
            })?;
            probe(number, bytes, catalog)
        })
        .collect()
}
