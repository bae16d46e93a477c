//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees through the public API.

use std::io::{Cursor, Read};

use base64::Engine as _;
use image::{DynamicImage, ImageFormat, RgbImage};
use paperforge_core::{
    generate, BlockKind, EngineConfig, ErrorCode, ExportRequest, GenerationError,
    GenerationPipeline, LayoutBlock,
};
use serde_json::{json, Value};
use zip::ZipArchive;

fn png(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

fn encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn scenario_paper() -> Value {
    json!({
        "title": "Study of X",
        "authors": "A. Author, B. Author",
        "abstract": "We study X in depth.",
        "keywords": [],
        "sections": [{"heading": "Introduction", "content": "Para one.\n\nPara two."}],
        "figures": [],
        "references": ["A. Author, Title, 2020."]
    })
}

fn full_request() -> Value {
    json!({
        "paper": {
            "title": "Study of X",
            "authors": "A. Author",
            "abstract": "We study X.",
            "keywords": ["k1", "k2", "k3"],
            "sections": [
                {"heading": "Introduction", "content": "Intro one.\n\nIntro two."},
                {"heading": "Method", "content": "Method one."},
                {"heading": "Results", "content": "Results one.\n\nResults two."},
                {"heading": "Conclusion", "content": "Done."}
            ],
            "figures": [
                {"index": 1, "caption": "Setup", "placement": "end-of-section", "section": "Results"},
                {"index": 2, "caption": "Pipeline", "placement": "inline", "section": "Introduction", "paragraph": 1},
                {"index": 3, "caption": "Extra", "placement": "inline"}
            ],
            "references": ["First ref.", "Second ref.", "Third ref."]
        },
        "images": [encode(&png(40, 20)), encode(&png(10, 10)), encode(&png(8, 16))]
    })
}

fn request_parts(request: &Value) -> (ExportRequest, Vec<Vec<u8>>) {
    let request = ExportRequest::from_json(&request.to_string()).unwrap();
    let images = request.decode_images().unwrap();
    (request, images)
}

fn layout_of(request: &Value) -> Vec<LayoutBlock> {
    let (request, images) = request_parts(request);
    GenerationPipeline::default().layout(&request.paper, &images).unwrap()
}

fn read_part(package: &[u8], name: &str) -> String {
    let mut archive = ZipArchive::new(Cursor::new(package)).unwrap();
    let mut part = archive.by_name(name).unwrap();
    let mut out = String::new();
    part.read_to_string(&mut out).unwrap();
    out
}

#[test]
fn invariant_generate_is_deterministic() {
    let body = full_request().to_string();
    let first = generate(&body).unwrap();
    let second = generate(&body).unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);

    let pipeline = GenerationPipeline::default();
    let a = pipeline.generate_json(&body).unwrap();
    let b = pipeline.generate_json(&body).unwrap();
    assert_eq!(a.job_hash, b.job_hash);
    assert_eq!(a.package_hash, b.package_hash);
    assert_ne!(a.id, b.id);
}

#[test]
fn invariant_section_numerals_sequential() {
    let headings: Vec<_> = layout_of(&full_request()).iter()
        .filter_map(|b| match &b.kind {
            BlockKind::Heading { numeral: Some(n), .. } => Some(n.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(headings, vec!["I", "II", "III", "IV"]);
}

#[test]
fn invariant_captions_follow_figure_order() {
    let blocks = layout_of(&full_request());
    let mut numbers: Vec<_> = blocks.iter()
        .filter_map(|b| match &b.kind {
            BlockKind::Figure { number, .. } => Some(*number),
            _ => None,
        })
        .collect();

    // Placement reorders blocks, never numbers
    assert_eq!(numbers, vec![2, 1, 3]);
    numbers.sort();
    assert_eq!(numbers, vec![1, 2, 3]);

    let texts: Vec<_> = blocks.iter().map(LayoutBlock::text).collect();
    assert!(texts.contains(&"Fig. 1. Setup".to_string()));
    assert!(texts.contains(&"Fig. 2. Pipeline".to_string()));
    assert!(texts.contains(&"Fig. 3. Extra".to_string()));
}

#[test]
fn invariant_reference_numbers_positional() {
    let references: Vec<_> = layout_of(&full_request()).iter()
        .filter_map(|b| match &b.kind {
            BlockKind::Reference(r) => Some(r.display()),
            _ => None,
        })
        .collect();
    assert_eq!(references, vec!["[1] First ref.", "[2] Second ref.", "[3] Third ref."]);
}

#[test]
fn invariant_keyword_line() {
    let texts: Vec<_> = layout_of(&full_request()).iter().map(LayoutBlock::text).collect();
    assert!(texts.contains(&"Keywords\u{2014}k1; k2; k3".to_string()));

    let empty = layout_of(&json!({ "paper": scenario_paper() }));
    assert!(!empty.iter().any(|b| b.text().starts_with("Keywords")));
}

#[test]
fn boundary_single_section_no_figures_or_references() {
    let mut paper = scenario_paper();
    paper["references"] = json!([]);
    let blocks = layout_of(&json!({ "paper": paper }));

    let headings: Vec<_> = blocks.iter()
        .filter(|b| matches!(b.kind, BlockKind::Heading { .. }))
        .map(LayoutBlock::text)
        .collect();
    assert_eq!(headings, vec!["I. INTRODUCTION"]);
    assert!(!blocks.iter().any(|b| matches!(
        b.kind,
        BlockKind::Figure { .. } | BlockKind::Reference(_)
    )));
}

fn figures_request(count: usize, image: &[u8]) -> Value {
    let figures: Vec<_> = (1..=count)
        .map(|i| json!({
            "index": i,
            "caption": format!("Figure {}", i),
            "placement": "end-of-section",
            "section": "Introduction"
        }))
        .collect();
    let mut paper = scenario_paper();
    paper["figures"] = json!(figures);
    json!({ "paper": paper, "images": vec![encode(image); count] })
}

#[test]
fn boundary_too_many_images_rejected() {
    let request = figures_request(11, &png(4, 4));
    let err = generate(&request.to_string()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert!(err.to_string().contains("Too many images"));
}

#[test]
fn boundary_figure_cap_accepted() {
    let max = EngineConfig::default().max_figures;
    let request = figures_request(max, &png(4, 4));
    let package = generate(&request.to_string()).unwrap();

    let archive = ZipArchive::new(Cursor::new(package.as_slice())).unwrap();
    let media = archive.file_names().filter(|n| n.starts_with("word/media/")).count();
    assert_eq!(media, max);

    let captions = layout_of(&request).iter()
        .filter(|b| matches!(b.kind, BlockKind::Figure { .. }))
        .count();
    assert_eq!(captions, max);
}

#[test]
fn boundary_image_byte_limit() {
    let image = png(4, 4);
    let request = figures_request(1, &image).to_string();

    let at_limit = GenerationPipeline::new(EngineConfig {
        max_image_bytes: image.len(),
        ..Default::default()
    });
    assert!(at_limit.generate_json(&request).is_ok());

    let one_under = GenerationPipeline::new(EngineConfig {
        max_image_bytes: image.len() - 1,
        ..Default::default()
    });
    match one_under.generate_json(&request).unwrap_err() {
        GenerationError::Validation(e) => assert!(e.has_field("images[0]")),
        other => panic!("expected validation error, got {}", other),
    }
}

#[test]
fn boundary_configured_cap_applies() {
    let pipeline = GenerationPipeline::new(EngineConfig { max_figures: 1, ..Default::default() });
    let err = pipeline.generate_json(&full_request().to_string()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[test]
fn scenario_study_of_x() {
    let request = json!({ "paper": scenario_paper() });
    let blocks = layout_of(&request);
    let body: Vec<_> = blocks.iter()
        .skip_while(|b| !matches!(b.kind, BlockKind::Heading { .. }))
        .map(LayoutBlock::text)
        .collect();
    assert_eq!(
        body,
        vec![
            "I. INTRODUCTION",
            "Para one.",
            "Para two.",
            "REFERENCES",
            "[1] A. Author, Title, 2020.",
        ]
    );

    let package = generate(&request.to_string()).unwrap();
    let document = read_part(&package, "word/document.xml");
    assert!(document.contains(">I. INTRODUCTION</w:t>"));
    assert!(document.contains(">Para one.</w:t>"));
    assert!(document.contains(">Para two.</w:t>"));
    assert!(document.contains(">REFERENCES</w:t>"));
    assert!(document.contains(">[1]</w:t>"));
    assert!(document.contains(">A. Author, Title, 2020.</w:t>"));
}

#[test]
fn package_columns_and_media() {
    let package = generate(&full_request().to_string()).unwrap();
    let document = read_part(&package, "word/document.xml");

    // front matter | two-column body | references
    assert_eq!(document.matches("<w:sectPr>").count(), 3);
    assert_eq!(document.matches(r#"<w:cols w:num="2""#).count(), 1);
    assert!(document.contains(r#"<w:pgSz w:w="11906" w:h="16838"/>"#));

    for n in 1..=3 {
        assert!(document.contains(&format!(r#"r:embed="rIdImage{}""#, n)));
        let mut archive = ZipArchive::new(Cursor::new(package.as_slice())).unwrap();
        assert!(archive.by_name(&format!("word/media/image{}.png", n)).is_ok());
    }

    let rels = read_part(&package, "word/_rels/document.xml.rels");
    assert!(rels.contains(r#"Target="media/image2.png""#));
    let types = read_part(&package, "[Content_Types].xml");
    assert_eq!(types.matches(r#"Extension="png""#).count(), 1);
}

#[test]
fn invalid_input_lists_every_violation() {
    let request = json!({
        "paper": {
            "title": "",
            "sections": [{"heading": " ", "content": "x"}],
            "references": [""]
        }
    });
    let (request, images) = request_parts(&request);
    let err = GenerationPipeline::default()
        .validate(&request.paper, &images)
        .unwrap_err();
    for field in ["title", "abstract", "keywords", "sections[0].heading", "references[0]"] {
        assert!(err.has_field(field), "no violation for {}", field);
    }
}

#[test]
fn bad_image_does_not_hide_paper_violations() {
    let request = json!({
        "paper": {"title": "", "sections": []},
        "images": ["!!!not-base64"]
    });
    let err = GenerationPipeline::default()
        .generate_json(&request.to_string())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);

    let GenerationError::Validation(e) = err else {
        panic!("expected validation error");
    };
    for field in ["images[0]", "title", "abstract", "sections"] {
        assert!(e.has_field(field), "no violation for {}", field);
    }
}

#[test]
fn figure_without_caption_rejected() {
    let mut request = figures_request(1, &png(4, 4));
    request["paper"]["figures"][0] = json!({"index": 1});
    let err = generate(&request.to_string()).unwrap_err();

    let GenerationError::Validation(e) = err else {
        panic!("expected validation error");
    };
    assert!(e.has_field("figures[0].caption"));
    assert!(e.has_field("figures[0].placement"));
}

#[test]
fn layout_failure_produces_no_bytes() {
    let mut request = full_request();
    request["paper"]["figures"][1]["paragraph"] = json!(9);
    let err = generate(&request.to_string()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::LayoutError);
    assert!(err.to_string().contains("Figure 2"));
}

#[test]
fn unsupported_image_is_serialization_error() {
    let mut request = full_request();
    request["images"][0] = json!(encode(b"plain text, not an image"));
    let err = generate(&request.to_string()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::SerializationError);
}

#[test]
fn malformed_request_is_validation_error() {
    let err = generate("{\"paper\": ").unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
}

#[test]
fn manifest_names_download() {
    let generated = GenerationPipeline::default()
        .generate_json(&json!({ "paper": scenario_paper() }).to_string())
        .unwrap();
    assert_eq!(generated.filename, "Study_of_X.docx");
    assert_eq!(
        generated.media_type,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );
    assert_eq!(generated.size_bytes, generated.bytes.len());
}

#[cfg(feature = "test-hooks")]
#[test]
fn invariant_generate_calls_validate() {
    use paperforge_core::pipeline::{get_validation_call_count, reset_validation_call_count};

    reset_validation_call_count();
    let _ = GenerationPipeline::default().generate_json(&full_request().to_string());
    assert!(get_validation_call_count() >= 1);
}
