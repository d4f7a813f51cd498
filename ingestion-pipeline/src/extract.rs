use lopdf::{content::Content, Document, Object};

use common::error::AppError;

// Vertical offsets closer than this are treated as the same text line.
const SAME_LINE_TOLERANCE: f32 = 0.01;

/// Extracts page-ordered plain text from a PDF byte stream.
///
/// Line breaks are reconstructed from the positional text fragments in the
/// content streams: a fragment at the same vertical offset as the previous
/// one continues the line, a changed offset starts a new one. Parsing runs
/// on the blocking pool; the bytes are a pure input and nothing is written.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let positional = extract_positional(&bytes)?;
        if !positional.trim().is_empty() {
            return Ok(positional);
        }

        // Some generators put no positional text operators in reach (e.g.
        // inherited resources lopdf cannot resolve). Fall back to the
        // pdf-extract text layer before giving up.
        pdf_extract::extract_text_from_mem(&bytes)
            .map(|text| text.trim().to_string())
            .map_err(|err| AppError::Extraction(format!("no extractable text layer: {err}")))
    })
    .await?
}

fn extract_positional(bytes: &[u8]) -> Result<String, AppError> {
    let document = Document::load_mem(bytes)
        .map_err(|err| AppError::Extraction(format!("failed to parse PDF document: {err}")))?;

    let mut pages_text = Vec::new();
    for (_number, page_id) in document.get_pages() {
        pages_text.push(extract_page(&document, page_id)?);
    }

    Ok(pages_text.join("\n"))
}

fn extract_page(document: &Document, page_id: (u32, u16)) -> Result<String, AppError> {
    let fonts = document.get_page_fonts(page_id);
    let raw_content = document
        .get_page_content(page_id)
        .map_err(|err| AppError::Extraction(format!("unreadable page content: {err}")))?;
    let content = Content::decode(&raw_content)
        .map_err(|err| AppError::Extraction(format!("malformed content stream: {err}")))?;

    let mut text = String::new();
    let mut encoding: Option<&str> = None;
    let mut y = 0.0f32;
    let mut leading = 0.0f32;
    let mut last_y: Option<f32> = None;

    for operation in &content.operations {
        match operation.operator.as_ref() {
            "BT" => {
                y = 0.0;
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operation.operands.first() {
                    encoding = fonts.get(name).map(|font| font.get_font_encoding());
                }
            }
            "Td" => {
                y += number(operation.operands.get(1));
            }
            "TD" => {
                let ty = number(operation.operands.get(1));
                y += ty;
                leading = -ty;
            }
            "TL" => {
                leading = number(operation.operands.first());
            }
            "Tm" => {
                y = number(operation.operands.get(5));
            }
            "T*" => {
                y -= leading;
            }
            "Tj" => {
                push_fragment(
                    &mut text,
                    &mut last_y,
                    y,
                    &decode_operand(operation.operands.first(), encoding),
                );
            }
            "'" => {
                y -= leading;
                push_fragment(
                    &mut text,
                    &mut last_y,
                    y,
                    &decode_operand(operation.operands.first(), encoding),
                );
            }
            "\"" => {
                y -= leading;
                push_fragment(
                    &mut text,
                    &mut last_y,
                    y,
                    &decode_operand(operation.operands.get(2), encoding),
                );
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operation.operands.first() {
                    let mut fragment = String::new();
                    for item in items {
                        if let Object::String(bytes, _) = item {
                            fragment.push_str(&Document::decode_text(encoding, bytes));
                        }
                    }
                    push_fragment(&mut text, &mut last_y, y, &fragment);
                }
            }
            _ => {}
        }
    }

    Ok(text)
}

/// Same vertical offset continues the line with a joining space; a changed
/// offset starts a new line.
fn push_fragment(text: &mut String, last_y: &mut Option<f32>, y: f32, fragment: &str) {
    if fragment.is_empty() {
        return;
    }

    match *last_y {
        None => {}
        Some(previous) if (previous - y).abs() < SAME_LINE_TOLERANCE => text.push(' '),
        Some(_) => text.push('\n'),
    }
    text.push_str(fragment);
    *last_y = Some(y);
}

fn decode_operand(operand: Option<&Object>, encoding: Option<&str>) -> String {
    match operand {
        Some(Object::String(bytes, _)) => Document::decode_text(encoding, bytes),
        _ => String::new(),
    }
}

#[allow(clippy::unnecessary_cast)]
fn number(operand: Option<&Object>) -> f32 {
    match operand {
        Some(Object::Integer(value)) => *value as f32,
        Some(Object::Real(value)) => *value as f32,
        _ => 0.0,
    }
}
