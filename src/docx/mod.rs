//! Document Serializer - WordprocessingML package
//!
//! Layout blocks in, a complete `.docx` package out. Either every part is
//! written or an error is returned; partial packages never escape.

mod body;
mod media;
mod parts;

use std::io::{Cursor, Write};

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use crate::layout::{BlockKind, LayoutBlock};
use crate::styles::StyleCatalog;

pub use media::EmbeddedImage;

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("Figure {figure}: unsupported image encoding ({format})")]
    UnsupportedImage { figure: u32, format: String },

    #[error("Figure {figure}: image could not be decoded: {source}")]
    ImageDecode {
        figure: u32,
        #[source]
        source: image::ImageError,
    },

    #[error("Figure {figure} needs image {image}, but {available} image(s) were supplied")]
    MissingImage { figure: u32, image: usize, available: usize },

    #[error("Layout has no title block")]
    MissingTitle,

    #[error("XML encoding failed: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Package assembly failed: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Manifest encoding failed: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Thin event writer over quick-xml for the package parts
pub(crate) struct Xml {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl Xml {
    pub fn new() -> quick_xml::Result<Self> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        Ok(Self { writer })
    }

    pub fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> quick_xml::Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(start))
    }

    pub fn close(&mut self, name: &str) -> quick_xml::Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))
    }

    pub fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> quick_xml::Result<()> {
        let start = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(start))
    }

    pub fn text(&mut self, text: &str) -> quick_xml::Result<()> {
        let clean = xml_safe(text);
        self.writer.write_event(Event::Text(BytesText::new(&clean)))
    }

    pub fn element(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> quick_xml::Result<()> {
        self.open(name, attrs)?;
        self.text(text)?;
        self.close(name)
    }

    pub fn finish(self) -> Vec<u8> {
        self.writer.into_inner().into_inner()
    }
}

/// Drop characters XML 1.0 cannot carry.
pub(crate) fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|&c| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}'))
        .collect()
}

fn document_meta(blocks: &[LayoutBlock]) -> Result<(&str, &str), SerializationError> {
    let title = blocks.iter()
        .find_map(|b| match &b.kind {
            BlockKind::Title { text } => Some(text.as_str()),
            _ => None,
        })
        .ok_or(SerializationError::MissingTitle)?;
    let authors = blocks.iter()
        .find_map(|b| match &b.kind {
            BlockKind::Authors { text } => Some(text.as_str()),
            _ => None,
        })
        .unwrap_or_default();
    Ok((title, authors))
}

/// Assemble the package. Output is byte-identical for identical input.
pub fn serialize(
    blocks: &[LayoutBlock],
    catalog: &StyleCatalog,
    images: &[Vec<u8>],
) -> Result<Vec<u8>, SerializationError> {
    let (title, authors) = document_meta(blocks)?;
    let media = media::collect(blocks, images, catalog)?;

    let mut entries: Vec<(String, Vec<u8>)> = vec![
        ("[Content_Types].xml".into(), parts::content_types(&media)?),
        ("_rels/.rels".into(), parts::package_rels()?),
        ("docProps/core.xml".into(), parts::core_properties(title, authors)?),
        ("docProps/app.xml".into(), parts::app_properties()?),
        ("word/document.xml".into(), body::document(blocks, catalog, &media)?),
        ("word/styles.xml".into(), parts::styles(catalog)?),
        ("word/settings.xml".into(), parts::settings()?),
        ("word/_rels/document.xml.rels".into(), parts::document_rels(&media)?),
    ];
    for image in &media {
        entries.push((format!("word/{}", image.target()), image.bytes.to_vec()));
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let xml_options: FileOptions<()> = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default());
    // Raster formats are already compressed
    let media_options: FileOptions<()> = FileOptions::default()
        .compression_method(CompressionMethod::Stored)
        .last_modified_time(DateTime::default());

    for (name, data) in &entries {
        let options = if name.starts_with("word/media/") { media_options } else { xml_options };
        zip.start_file(name.as_str(), options)?;
        zip.write_all(data)?;
    }

    let package = zip.finish()?.into_inner();
    log::debug!("assembled package: {} parts, {} bytes", entries.len(), package.len());
    Ok(package)
}
