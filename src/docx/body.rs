//! `word/document.xml`
//!
//! A section's properties travel in the last paragraph of that section, so a
//! `w:sectPr` is attached wherever the next block changes column mode. The
//! final section's properties close the body.

use super::parts::{NS_R, NS_W};
use super::{EmbeddedImage, SerializationError, Xml};
use crate::layout::{
    figure_label, heading_label, BlockKind, ColumnMode, LayoutBlock, ABSTRACT_MARKER,
    KEYWORDS_MARKER, KEYWORD_SEPARATOR,
};
use crate::styles::{StyleCatalog, StyleId};

const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

#[derive(Debug, Clone, Copy, Default)]
struct RunStyle {
    bold: bool,
    italic: bool,
}

const PLAIN: RunStyle = RunStyle { bold: false, italic: false };
const BOLD: RunStyle = RunStyle { bold: true, italic: false };
const BOLD_ITALIC: RunStyle = RunStyle { bold: true, italic: true };

enum Run<'a> {
    Text(&'a str, RunStyle),
    Tab,
    Image(&'a EmbeddedImage<'a>),
}

/// Column mode of a section that ends here, and whether it is the first section
#[derive(Debug, Clone, Copy)]
struct SectionEnd {
    mode: ColumnMode,
    first: bool,
}

struct DocumentWriter<'c> {
    xml: Xml,
    catalog: &'c StyleCatalog,
}

impl<'c> DocumentWriter<'c> {
    fn section_properties(&mut self, end: SectionEnd) -> quick_xml::Result<()> {
        let page = &self.catalog.page;
        let m = &page.margins;
        let (width, height) = (page.width.to_string(), page.height.to_string());
        let (top, bottom) = (m.top.to_string(), m.bottom.to_string());
        let (left, right) = (m.left.to_string(), m.right.to_string());
        let columns = end.mode.columns().to_string();
        let gap = self.catalog.columns.gap.to_string();

        self.xml.open("w:sectPr", &[])?;
        if !end.first {
            self.xml.empty("w:type", &[("w:val", "continuous")])?;
        }
        self.xml.empty("w:pgSz", &[("w:w", width.as_str()), ("w:h", height.as_str())])?;
        self.xml.empty("w:pgMar", &[
            ("w:top", top.as_str()),
            ("w:right", right.as_str()),
            ("w:bottom", bottom.as_str()),
            ("w:left", left.as_str()),
            ("w:header", "720"),
            ("w:footer", "720"),
            ("w:gutter", "0"),
        ])?;
        self.xml.empty("w:cols", &[("w:num", columns.as_str()), ("w:space", gap.as_str())])?;
        self.xml.close("w:sectPr")
    }

    fn paragraph(
        &mut self,
        style: StyleId,
        runs: &[Run<'_>],
        section_end: Option<SectionEnd>,
    ) -> quick_xml::Result<()> {
        self.xml.open("w:p", &[])?;
        self.xml.open("w:pPr", &[])?;
        self.xml.empty("w:pStyle", &[("w:val", style.as_str())])?;
        if let Some(end) = section_end {
            self.section_properties(end)?;
        }
        self.xml.close("w:pPr")?;

        for run in runs {
            self.xml.open("w:r", &[])?;
            match run {
                Run::Text(text, style) => {
                    if style.bold || style.italic {
                        self.xml.open("w:rPr", &[])?;
                        if style.bold {
                            self.xml.empty("w:b", &[])?;
                        }
                        if style.italic {
                            self.xml.empty("w:i", &[])?;
                        }
                        self.xml.close("w:rPr")?;
                    }
                    self.xml.element("w:t", &[("xml:space", "preserve")], text)?;
                }
                Run::Tab => self.xml.empty("w:tab", &[])?,
                Run::Image(image) => self.drawing(image)?,
            }
            self.xml.close("w:r")?;
        }

        self.xml.close("w:p")
    }

    fn drawing(&mut self, image: &EmbeddedImage<'_>) -> quick_xml::Result<()> {
        let (cx, cy) = (image.cx.to_string(), image.cy.to_string());
        let id = image.number.to_string();
        let name = format!("Figure {}", image.number);
        let file = image.target();
        let rel_id = image.rel_id();

        self.xml.open("w:drawing", &[])?;
        self.xml.open("wp:inline", &[("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")])?;
        self.xml.empty("wp:extent", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        self.xml.empty("wp:effectExtent", &[("l", "0"), ("t", "0"), ("r", "0"), ("b", "0")])?;
        self.xml.empty("wp:docPr", &[("id", id.as_str()), ("name", name.as_str())])?;
        self.xml.open("wp:cNvGraphicFramePr", &[])?;
        self.xml.empty("a:graphicFrameLocks", &[("noChangeAspect", "1")])?;
        self.xml.close("wp:cNvGraphicFramePr")?;

        self.xml.open("a:graphic", &[])?;
        self.xml.open("a:graphicData", &[("uri", NS_PIC)])?;
        self.xml.open("pic:pic", &[])?;

        self.xml.open("pic:nvPicPr", &[])?;
        self.xml.empty("pic:cNvPr", &[("id", id.as_str()), ("name", file.as_str())])?;
        self.xml.empty("pic:cNvPicPr", &[])?;
        self.xml.close("pic:nvPicPr")?;

        self.xml.open("pic:blipFill", &[])?;
        self.xml.empty("a:blip", &[("r:embed", rel_id.as_str())])?;
        self.xml.open("a:stretch", &[])?;
        self.xml.empty("a:fillRect", &[])?;
        self.xml.close("a:stretch")?;
        self.xml.close("pic:blipFill")?;

        self.xml.open("pic:spPr", &[])?;
        self.xml.open("a:xfrm", &[])?;
        self.xml.empty("a:off", &[("x", "0"), ("y", "0")])?;
        self.xml.empty("a:ext", &[("cx", cx.as_str()), ("cy", cy.as_str())])?;
        self.xml.close("a:xfrm")?;
        self.xml.open("a:prstGeom", &[("prst", "rect")])?;
        self.xml.empty("a:avLst", &[])?;
        self.xml.close("a:prstGeom")?;
        self.xml.close("pic:spPr")?;

        self.xml.close("pic:pic")?;
        self.xml.close("a:graphicData")?;
        self.xml.close("a:graphic")?;
        self.xml.close("wp:inline")?;
        self.xml.close("w:drawing")
    }

    fn block(
        &mut self,
        block: &LayoutBlock,
        media: &[EmbeddedImage<'_>],
        section_end: Option<SectionEnd>,
    ) -> Result<(), SerializationError> {
        match &block.kind {
            BlockKind::Title { text } => {
                self.paragraph(StyleId::Title, &[Run::Text(text, PLAIN)], section_end)?
            }
            BlockKind::Authors { text } => {
                self.paragraph(StyleId::Authors, &[Run::Text(text, PLAIN)], section_end)?
            }
            BlockKind::Abstract { text } => self.paragraph(
                StyleId::Abstract,
                &[Run::Text(ABSTRACT_MARKER, BOLD_ITALIC), Run::Text(text, PLAIN)],
                section_end,
            )?,
            BlockKind::Keywords { keywords } => {
                let joined = keywords.join(KEYWORD_SEPARATOR);
                self.paragraph(
                    StyleId::Keywords,
                    &[Run::Text(KEYWORDS_MARKER, BOLD_ITALIC), Run::Text(&joined, PLAIN)],
                    section_end,
                )?
            }
            BlockKind::Heading { numeral, text } => {
                let label = heading_label(numeral.as_deref(), text);
                self.paragraph(StyleId::Heading, &[Run::Text(&label, PLAIN)], section_end)?
            }
            BlockKind::Paragraph { text } => {
                self.paragraph(StyleId::Body, &[Run::Text(text, PLAIN)], section_end)?
            }
            BlockKind::Figure { number, caption, image } => {
                let embedded = media.iter()
                    .find(|m| m.number == *number)
                    .ok_or(SerializationError::MissingImage {
                        figure: *number,
                        image: *image,
                        available: media.len(),
                    })?;
                self.paragraph(StyleId::Figure, &[Run::Image(embedded)], None)?;
                let label = format!("{} ", figure_label(*number));
                self.paragraph(
                    StyleId::Caption,
                    &[Run::Text(&label, BOLD), Run::Text(caption, PLAIN)],
                    section_end,
                )?
            }
            BlockKind::Reference(reference) => self.paragraph(
                StyleId::Reference,
                &[Run::Text(&reference.label, PLAIN), Run::Tab, Run::Text(&reference.text, PLAIN)],
                section_end,
            )?,
        }
        Ok(())
    }
}

pub fn document(
    blocks: &[LayoutBlock],
    catalog: &StyleCatalog,
    media: &[EmbeddedImage<'_>],
) -> Result<Vec<u8>, SerializationError> {
    let mut writer = DocumentWriter { xml: Xml::new()?, catalog };
    writer.xml.open("w:document", &[
        ("xmlns:w", NS_W),
        ("xmlns:r", NS_R),
        ("xmlns:wp", NS_WP),
        ("xmlns:a", NS_A),
        ("xmlns:pic", NS_PIC),
    ])?;
    writer.xml.open("w:body", &[])?;

    let mut first_section = true;
    for (i, block) in blocks.iter().enumerate() {
        let section_end = match blocks.get(i + 1) {
            Some(next) if next.mode != block.mode => Some(SectionEnd { mode: block.mode, first: first_section }),
            _ => None,
        };
        writer.block(block, media, section_end)?;
        if section_end.is_some() {
            first_section = false;
        }
    }

    let last_mode = blocks.last().map_or(ColumnMode::Single, |b| b.mode);
    writer.section_properties(SectionEnd { mode: last_mode, first: first_section })?;

    writer.xml.close("w:body")?;
    writer.xml.close("w:document")?;
    Ok(writer.xml.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::references::RenderedReference;
    use crate::styles::IEEE_CONFERENCE;

    fn render(blocks: &[LayoutBlock]) -> String {
        String::from_utf8(document(blocks, &IEEE_CONFERENCE, &[]).unwrap()).unwrap()
    }

    fn block(mode: ColumnMode, kind: BlockKind) -> LayoutBlock {
        LayoutBlock { mode, kind }
    }

    #[test]
    fn test_section_breaks_at_mode_changes() {
        let blocks = vec![
            block(ColumnMode::Single, BlockKind::Title { text: "T".into() }),
            block(ColumnMode::Single, BlockKind::Abstract { text: "A".into() }),
            block(ColumnMode::Double, BlockKind::Heading { numeral: Some("I".into()), text: "INTRO".into() }),
            block(ColumnMode::Double, BlockKind::Paragraph { text: "P".into() }),
            block(ColumnMode::Single, BlockKind::Heading { numeral: None, text: "REFERENCES".into() }),
        ];
        let xml = render(&blocks);

        assert_eq!(xml.matches("<w:sectPr>").count(), 3);
        assert_eq!(xml.matches(r#"<w:type w:val="continuous"/>"#).count(), 2);
        assert_eq!(xml.matches(r#"<w:cols w:num="2" w:space="360"/>"#).count(), 1);

        // Single-column section closes on the abstract, body closes on its last paragraph
        let abstract_pos = xml.find(">A</w:t>").unwrap();
        let first_break = xml.find("<w:sectPr>").unwrap();
        let heading_pos = xml.find("I. INTRO").unwrap();
        assert!(first_break < abstract_pos && abstract_pos < heading_pos);
        assert!(xml.trim_end().ends_with("</w:sectPr></w:body></w:document>"));
    }

    #[test]
    fn test_single_mode_document_has_one_section() {
        let blocks = vec![block(ColumnMode::Single, BlockKind::Title { text: "T".into() })];
        let xml = render(&blocks);
        assert_eq!(xml.matches("<w:sectPr>").count(), 1);
        assert!(!xml.contains("continuous"));
    }

    #[test]
    fn test_marker_runs() {
        let blocks = vec![
            block(ColumnMode::Single, BlockKind::Title { text: "T".into() }),
            block(ColumnMode::Single, BlockKind::Keywords { keywords: vec!["a".into(), "b".into()] }),
        ];
        let xml = render(&blocks);
        assert!(xml.contains("<w:rPr><w:b/><w:i/></w:rPr><w:t xml:space=\"preserve\">Keywords\u{2014}</w:t>"));
        assert!(xml.contains(">a; b</w:t>"));
    }

    #[test]
    fn test_reference_label_and_text_share_paragraph() {
        let blocks = vec![
            block(ColumnMode::Single, BlockKind::Title { text: "T".into() }),
            block(ColumnMode::Single, BlockKind::Reference(RenderedReference {
                number: 1,
                label: "[1]".into(),
                text: "A. Author, Title, 2020.".into(),
            })),
        ];
        let xml = render(&blocks);
        assert!(xml.contains(
            "<w:t xml:space=\"preserve\">[1]</w:t></w:r><w:r><w:tab/></w:r><w:r><w:t xml:space=\"preserve\">A. Author, Title, 2020.</w:t>"
        ));
    }

    #[test]
    fn test_figure_without_media_fails() {
        let blocks = vec![
            block(ColumnMode::Single, BlockKind::Title { text: "T".into() }),
            block(ColumnMode::Double, BlockKind::Figure { number: 1, caption: "c".into(), image: 0 }),
        ];
        assert!(matches!(
            document(&blocks, &IEEE_CONFERENCE, &[]),
            Err(SerializationError::MissingImage { figure: 1, .. })
        ));
    }
}
