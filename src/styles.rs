//! Style Catalog - the fixed conference layout
//!
//! Units follow WordprocessingML: lengths in twips (1/20 pt), font sizes in
//! half-points, drawing extents in EMU.

use serde::Serialize;

pub const TWIPS_PER_INCH: u32 = 1440;
pub const EMU_PER_INCH: u64 = 914_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleId {
    Title,
    Authors,
    Abstract,
    Keywords,
    Heading,
    Body,
    Figure,
    Caption,
    Reference,
}

impl StyleId {
    /// Style id as written into the package
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleId::Title => "PaperTitle",
            StyleId::Authors => "PaperAuthors",
            StyleId::Abstract => "PaperAbstract",
            StyleId::Keywords => "PaperKeywords",
            StyleId::Heading => "PaperHeading",
            StyleId::Body => "PaperBody",
            StyleId::Figure => "PaperFigure",
            StyleId::Caption => "PaperCaption",
            StyleId::Reference => "PaperReference",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Both,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Both => "both",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    pub id: StyleId,
    pub name: &'static str,
    pub font: &'static str,
    pub size_half_points: u32,
    pub bold: bool,
    pub italic: bool,
    pub small_caps: bool,
    pub alignment: Alignment,
    pub space_before: u32,
    pub space_after: u32,
    pub first_line_indent: u32,
    pub left_indent: u32,
    pub hanging_indent: u32,
    /// Line pitch in 240ths of a line (240 = single)
    pub line: u32,
    pub keep_next: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Margins {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub margins: Margins,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRules {
    /// Applies to section content only; front matter and references are single column
    pub body_columns: u32,
    pub gap: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleCatalog {
    pub name: &'static str,
    pub page: PageGeometry,
    pub columns: ColumnRules,
    pub figure_width_emu: u64,
    pub styles: &'static [ParagraphStyle],
}

impl StyleCatalog {
    pub fn style(&self, id: StyleId) -> Option<&ParagraphStyle> {
        self.styles.iter().find(|s| s.id == id)
    }

    pub fn text_width(&self) -> u32 {
        let m = &self.page.margins;
        self.page.width.saturating_sub(m.left + m.right)
    }

    /// Width of one body column in twips
    pub fn column_width(&self) -> u32 {
        let columns = self.columns.body_columns.max(1);
        let gaps = self.columns.gap * (columns - 1);
        self.text_width().saturating_sub(gaps) / columns
    }

    /// Figure width clamped to the body column
    pub fn figure_width(&self) -> u64 {
        let column_emu = self.column_width() as u64 * EMU_PER_INCH / TWIPS_PER_INCH as u64;
        self.figure_width_emu.min(column_emu)
    }
}

const FONT: &str = "Times New Roman";

const fn style(id: StyleId, name: &'static str, size_pt: u32) -> ParagraphStyle {
    ParagraphStyle {
        id,
        name,
        font: FONT,
        size_half_points: size_pt * 2,
        bold: false,
        italic: false,
        small_caps: false,
        alignment: Alignment::Both,
        space_before: 0,
        space_after: 0,
        first_line_indent: 0,
        left_indent: 0,
        hanging_indent: 0,
        line: 240,
        keep_next: false,
    }
}

static IEEE_STYLES: [ParagraphStyle; 9] = [
    ParagraphStyle {
        bold: true,
        alignment: Alignment::Center,
        space_after: 240,
        ..style(StyleId::Title, "Paper Title", 24)
    },
    ParagraphStyle {
        alignment: Alignment::Center,
        space_after: 240,
        ..style(StyleId::Authors, "Paper Authors", 11)
    },
    ParagraphStyle {
        italic: true,
        space_after: 120,
        ..style(StyleId::Abstract, "Paper Abstract", 9)
    },
    ParagraphStyle {
        italic: true,
        space_after: 240,
        ..style(StyleId::Keywords, "Paper Keywords", 9)
    },
    ParagraphStyle {
        bold: true,
        small_caps: true,
        alignment: Alignment::Center,
        space_before: 240,
        space_after: 120,
        keep_next: true,
        ..style(StyleId::Heading, "Paper Heading", 10)
    },
    ParagraphStyle {
        first_line_indent: 360,
        ..style(StyleId::Body, "Paper Body", 10)
    },
    ParagraphStyle {
        alignment: Alignment::Center,
        space_before: 120,
        keep_next: true,
        ..style(StyleId::Figure, "Paper Figure", 10)
    },
    ParagraphStyle {
        alignment: Alignment::Center,
        space_before: 120,
        space_after: 240,
        ..style(StyleId::Caption, "Paper Caption", 8)
    },
    ParagraphStyle {
        left_indent: 360,
        hanging_indent: 360,
        ..style(StyleId::Reference, "Paper Reference", 8)
    },
];

/// A4, 0.75in top, 1in bottom, 0.625in sides, 0.25in column gap.
pub static IEEE_CONFERENCE: StyleCatalog = StyleCatalog {
    name: "IEEE Conference (A4)",
    page: PageGeometry {
        name: "A4",
        width: 11906,
        height: 16838,
        margins: Margins { top: 1080, bottom: 1440, left: 900, right: 900 },
    },
    columns: ColumnRules { body_columns: 2, gap: 360 },
    figure_width_emu: 3 * EMU_PER_INCH,
    styles: &IEEE_STYLES,
};
