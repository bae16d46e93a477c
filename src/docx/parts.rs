//! Package plumbing parts: content types, relationships, styles, properties

use std::collections::BTreeSet;

use super::{EmbeddedImage, Xml};
use crate::styles::{ParagraphStyle, StyleCatalog, StyleId};

pub const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

const MAIN_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";

pub fn content_types(media: &[EmbeddedImage<'_>]) -> quick_xml::Result<Vec<u8>> {
    let mut xml = Xml::new()?;
    xml.open("Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    xml.empty("Default", &[
        ("Extension", "rels"),
        ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
    ])?;
    xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;

    let encodings: BTreeSet<_> = media.iter().map(|m| (m.extension, m.content_type)).collect();
    for (extension, content_type) in encodings {
        xml.empty("Default", &[("Extension", extension), ("ContentType", content_type)])?;
    }

    for (part, content_type) in [
        ("/word/document.xml", MAIN_CONTENT_TYPE),
        ("/word/styles.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"),
        ("/word/settings.xml", "application/vnd.openxmlformats-officedocument.wordprocessingml.settings+xml"),
        ("/docProps/core.xml", "application/vnd.openxmlformats-package.core-properties+xml"),
        ("/docProps/app.xml", "application/vnd.openxmlformats-officedocument.extended-properties+xml"),
    ] {
        xml.empty("Override", &[("PartName", part), ("ContentType", content_type)])?;
    }
    xml.close("Types")?;
    Ok(xml.finish())
}

fn relationships(entries: &[(String, String, String)]) -> quick_xml::Result<Vec<u8>> {
    let mut xml = Xml::new()?;
    xml.open("Relationships", &[("xmlns", NS_PACKAGE_RELS)])?;
    for (id, kind, target) in entries {
        xml.empty("Relationship", &[("Id", id.as_str()), ("Type", kind.as_str()), ("Target", target.as_str())])?;
    }
    xml.close("Relationships")?;
    Ok(xml.finish())
}

pub fn package_rels() -> quick_xml::Result<Vec<u8>> {
    relationships(&[
        ("rId1".into(), format!("{}/officeDocument", REL_TYPE_BASE), "word/document.xml".into()),
        (
            "rId2".into(),
            "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties".into(),
            "docProps/core.xml".into(),
        ),
        ("rId3".into(), format!("{}/extended-properties", REL_TYPE_BASE), "docProps/app.xml".into()),
    ])
}

pub fn document_rels(media: &[EmbeddedImage<'_>]) -> quick_xml::Result<Vec<u8>> {
    let mut entries = vec![
        ("rId1".to_string(), format!("{}/styles", REL_TYPE_BASE), "styles.xml".to_string()),
        ("rId2".to_string(), format!("{}/settings", REL_TYPE_BASE), "settings.xml".to_string()),
    ];
    entries.extend(media.iter().map(|m| (m.rel_id(), format!("{}/image", REL_TYPE_BASE), m.target())));
    relationships(&entries)
}

pub fn core_properties(title: &str, creator: &str) -> quick_xml::Result<Vec<u8>> {
    let mut xml = Xml::new()?;
    xml.open("cp:coreProperties", &[
        ("xmlns:cp", "http://schemas.openxmlformats.org/package/2006/metadata/core-properties"),
        ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
        ("xmlns:dcterms", "http://purl.org/dc/terms/"),
        ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
    ])?;
    xml.element("dc:title", &[], title)?;
    if !creator.is_empty() {
        xml.element("dc:creator", &[], creator)?;
    }
    xml.close("cp:coreProperties")?;
    Ok(xml.finish())
}

pub fn app_properties() -> quick_xml::Result<Vec<u8>> {
    let mut xml = Xml::new()?;
    xml.open("Properties", &[(
        "xmlns",
        "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
    )])?;
    xml.element("Application", &[], "PaperForge")?;
    xml.element("AppVersion", &[], crate::ENGINE_VERSION)?;
    xml.close("Properties")?;
    Ok(xml.finish())
}

pub fn settings() -> quick_xml::Result<Vec<u8>> {
    let mut xml = Xml::new()?;
    xml.open("w:settings", &[("xmlns:w", NS_W)])?;
    xml.empty("w:defaultTabStop", &[("w:val", "720")])?;
    xml.open("w:compat", &[])?;
    xml.empty("w:compatSetting", &[
        ("w:name", "compatibilityMode"),
        ("w:uri", "http://schemas.microsoft.com/office/word"),
        ("w:val", "15"),
    ])?;
    xml.close("w:compat")?;
    xml.close("w:settings")?;
    Ok(xml.finish())
}

fn paragraph_style(xml: &mut Xml, style: &ParagraphStyle) -> quick_xml::Result<()> {
    xml.open("w:style", &[
        ("w:type", "paragraph"),
        ("w:customStyle", "1"),
        ("w:styleId", style.id.as_str()),
    ])?;
    xml.empty("w:name", &[("w:val", style.name)])?;
    xml.empty("w:basedOn", &[("w:val", "Normal")])?;
    xml.empty("w:qFormat", &[])?;

    xml.open("w:pPr", &[])?;
    if style.keep_next {
        xml.empty("w:keepNext", &[])?;
    }
    let (before, after, line) = (
        style.space_before.to_string(),
        style.space_after.to_string(),
        style.line.to_string(),
    );
    xml.empty("w:spacing", &[
        ("w:before", before.as_str()),
        ("w:after", after.as_str()),
        ("w:line", line.as_str()),
        ("w:lineRule", "auto"),
    ])?;
    let left = style.left_indent.to_string();
    if style.hanging_indent > 0 {
        let hanging = style.hanging_indent.to_string();
        xml.empty("w:ind", &[("w:left", left.as_str()), ("w:hanging", hanging.as_str())])?;
    } else if style.first_line_indent > 0 {
        let first = style.first_line_indent.to_string();
        xml.empty("w:ind", &[("w:left", left.as_str()), ("w:firstLine", first.as_str())])?;
    }
    xml.empty("w:jc", &[("w:val", style.alignment.as_str())])?;
    xml.close("w:pPr")?;

    xml.open("w:rPr", &[])?;
    xml.empty("w:rFonts", &[
        ("w:ascii", style.font),
        ("w:hAnsi", style.font),
        ("w:cs", style.font),
    ])?;
    if style.bold {
        xml.empty("w:b", &[])?;
    }
    if style.italic {
        xml.empty("w:i", &[])?;
    }
    if style.small_caps {
        xml.empty("w:smallCaps", &[])?;
    }
    let size = style.size_half_points.to_string();
    xml.empty("w:sz", &[("w:val", size.as_str())])?;
    xml.empty("w:szCs", &[("w:val", size.as_str())])?;
    xml.close("w:rPr")?;

    xml.close("w:style")
}

/// `word/styles.xml` generated from the catalog
pub fn styles(catalog: &StyleCatalog) -> quick_xml::Result<Vec<u8>> {
    let body_size = catalog.style(StyleId::Body)
        .map_or(20, |s| s.size_half_points)
        .to_string();
    let font = catalog.styles.first().map_or("Times New Roman", |s| s.font);

    let mut xml = Xml::new()?;
    xml.open("w:styles", &[("xmlns:w", NS_W)])?;

    xml.open("w:docDefaults", &[])?;
    xml.open("w:rPrDefault", &[])?;
    xml.open("w:rPr", &[])?;
    xml.empty("w:rFonts", &[("w:ascii", font), ("w:hAnsi", font), ("w:cs", font)])?;
    xml.empty("w:sz", &[("w:val", body_size.as_str())])?;
    xml.empty("w:szCs", &[("w:val", body_size.as_str())])?;
    xml.close("w:rPr")?;
    xml.close("w:rPrDefault")?;
    xml.close("w:docDefaults")?;

    xml.open("w:style", &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")])?;
    xml.empty("w:name", &[("w:val", "Normal")])?;
    xml.empty("w:qFormat", &[])?;
    xml.close("w:style")?;

    for style in catalog.styles {
        paragraph_style(&mut xml, style)?;
    }

    xml.close("w:styles")?;
    Ok(xml.finish())
}
