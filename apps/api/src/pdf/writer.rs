//! Turns composed pages into a PDF file with lopdf.
//!
//! Both faces are the unembedded base-14 Helvetica pair with
//! WinAnsiEncoding; text is encoded through lopdf's WinAnsi table.

use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Encoding, Object, ObjectId, Stream};

use crate::pdf::canvas::{DrawOp, PageContent, PAGE_HEIGHT_PT, PAGE_WIDTH_PT};
use crate::pdf::font_metrics::FontFace;
use crate::pdf::GenerationError;

/// Values written into the document Info dictionary.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub producer: String,
    pub created_at: DateTime<Utc>,
}

pub fn write_document(
    pages: &[PageContent],
    info: &DocumentInfo,
) -> Result<Vec<u8>, GenerationError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for face in FontFace::ALL {
        let font_id = doc.add_object(font_dictionary(face));
        fonts.set(face.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! { "Font" => fonts });

    let win_ansi = font_dictionary(FontFace::Regular);
    let encoding = win_ansi.get_font_encoding(&doc)?;

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = Content {
            operations: page_operations(page, &encoding),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box(),
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.set_object(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
        },
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = info_dictionary(&mut doc, info);
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    doc.compress();
    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| GenerationError::Serialize(e.to_string()))?;
    Ok(out)
}

fn font_dictionary(face: FontFace) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => face.base_font(),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn media_box() -> Vec<Object> {
    vec![0.into(), 0.into(), PAGE_WIDTH_PT.into(), PAGE_HEIGHT_PT.into()]
}

fn info_dictionary(doc: &mut Document, info: &DocumentInfo) -> ObjectId {
    doc.add_object(dictionary! {
        "Title" => lopdf::text_string(&info.title),
        "Producer" => lopdf::text_string(&info.producer),
        "CreationDate" => Object::string_literal(
            info.created_at.format("D:%Y%m%d%H%M%SZ").to_string(),
        ),
    })
}

fn page_operations(page: &PageContent, encoding: &Encoding) -> Vec<Operation> {
    let mut ops = Vec::new();
    for op in page.ops() {
        match op {
            DrawOp::Text {
                face,
                size,
                x,
                y,
                text,
            } => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![face.resource_name().into(), (*size).into()],
                ));
                ops.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(encode_text(encoding, text))],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            DrawOp::Line {
                from,
                to,
                width,
                gray,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new("G", vec![(*gray).into()]));
                ops.push(Operation::new("w", vec![(*width).into()]));
                ops.push(Operation::new("m", vec![from.0.into(), from.1.into()]));
                ops.push(Operation::new("l", vec![to.0.into(), to.1.into()]));
                ops.push(Operation::new("S", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            DrawOp::FillRect {
                x,
                y,
                width,
                height,
                gray,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new("g", vec![(*gray).into()]));
                ops.push(Operation::new(
                    "re",
                    vec![(*x).into(), (*y).into(), (*width).into(), (*height).into()],
                ));
                ops.push(Operation::new("f", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
        }
    }
    ops
}

/// WinAnsi bytes for `text`. Tabs become spaces, other control characters
/// are dropped and characters outside the encoding print as `?`.
fn encode_text(encoding: &Encoding, text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        let c = match c {
            '\t' => ' ',
            c if c.is_control() => continue,
            c => c,
        };
        let encoded = Document::encode_text(encoding, c.encode_utf8(&mut buf));
        if encoded.is_empty() {
            out.push(b'?');
        } else {
            out.extend(encoded);
        }
    }
    out
}
