use std::io::{Cursor, Read, Write};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::combine::pdf::render_text_pdf;
use crate::error::ProcessError;

const DOCUMENT_PART: &str = "word/document.xml";

fn open(bytes: &[u8], index: usize) -> Result<ZipArchive<Cursor<&[u8]>>, ProcessError> {
    ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        ProcessError::DocxProcessing(format!("input {} is not a valid DOCX: {}", index + 1, e))
    })
}

fn read_document_xml<R: Read + std::io::Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<String, ProcessError> {
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ProcessError::DocxProcessing(format!("Failed to find document.xml: {}", e)))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ProcessError::DocxProcessing(format!("Failed to read document.xml: {}", e)))?;
    Ok(xml)
}

/// Paragraph text of a DOCX package, one line per paragraph.
pub fn extract_text(bytes: &[u8]) -> Result<String, ProcessError> {
    let mut archive = open(bytes, 0)?;
    let xml = read_document_xml(&mut archive)?;
    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<String, ProcessError> {
    let mut reader = Reader::from_str(xml);

    let mut text = String::new();
    let mut in_text_element = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_element = true;
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"br" | b"cr" => text.push('\n'),
                b"tab" => text.push('\t'),
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text_element {
                    let decoded = e.decode().unwrap_or_default();
                    text.push_str(&decoded);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text_element {
                    if let Ok(Some(ch)) = e.resolve_char_ref() {
                        text.push(ch);
                    } else if let Ok(name) = e.decode() {
                        if let Some(value) = quick_xml::escape::resolve_predefined_entity(&name) {
                            text.push_str(value);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProcessError::DocxProcessing(format!(
                    "XML parsing error: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(text)
}

/// Renders the DOCX paragraphs onto PDF pages.
pub fn docx_to_pdf(bytes: &[u8]) -> Result<Vec<u8>, ProcessError> {
    let text = extract_text(bytes)?;
    render_text_pdf(&text)
}

/// Byte range of the content between `<w:body ...>` and `</w:body>`.
fn body_range(xml: &str) -> Option<(usize, usize)> {
    let open = xml.find("<w:body")?;
    let start = open + xml[open..].find('>')? + 1;
    let end = xml.rfind("</w:body>")?;
    (start <= end).then_some((start, end))
}

/// Offset of the trailing section properties inside a body, if any.
fn section_properties_start(body: &str) -> Option<usize> {
    body.rfind("<w:sectPr")
}

/// Body elements of a later document: everything except its section properties.
fn body_elements(xml: &str, index: usize) -> Result<&str, ProcessError> {
    let (start, end) = body_range(xml).ok_or_else(|| {
        ProcessError::DocxProcessing(format!("input {} has no document body", index + 1))
    })?;
    let body = &xml[start..end];
    Ok(match section_properties_start(body) {
        Some(sect) => &body[..sect],
        None => body,
    })
}

/// Appends the body elements of every later package to the first one.
///
/// The result keeps the first package's parts (styles, numbering, section
/// properties). Relationships of later packages are not carried over.
pub fn merge_docx(inputs: &[Vec<u8>]) -> Result<Vec<u8>, ProcessError> {
    let (first, rest) = inputs.split_first().ok_or(ProcessError::EmptyInput)?;
    if rest.is_empty() {
        return Ok(first.clone());
    }

    let mut base = open(first, 0)?;
    let base_xml = read_document_xml(&mut base)?;
    let (body_start, body_end) = body_range(&base_xml)
        .ok_or_else(|| ProcessError::DocxProcessing("input 1 has no document body".to_string()))?;
    let insert_at = section_properties_start(&base_xml[body_start..body_end])
        .map(|offset| body_start + offset)
        .unwrap_or(body_end);

    let mut appended = String::new();
    for (offset, bytes) in rest.iter().enumerate() {
        let index = offset + 1;
        let mut archive = open(bytes, index)?;
        let xml = read_document_xml(&mut archive)?;
        appended.push_str(body_elements(&xml, index)?);
    }

    let mut merged_xml = String::with_capacity(base_xml.len() + appended.len());
    merged_xml.push_str(&base_xml[..insert_at]);
    merged_xml.push_str(&appended);
    merged_xml.push_str(&base_xml[insert_at..]);

    rewrite_package(&mut base, &merged_xml)
}

fn zip_error(e: impl std::fmt::Display) -> ProcessError {
    ProcessError::DocxProcessing(format!("Failed to write DOCX: {}", e))
}

fn rewrite_package<R: Read + std::io::Seek>(
    base: &mut ZipArchive<R>,
    document_xml: &str,
) -> Result<Vec<u8>, ProcessError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..base.len() {
        let mut entry = base.by_index(i).map_err(zip_error)?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            writer.add_directory(name, options).map_err(zip_error)?;
            continue;
        }

        writer.start_file(name.as_str(), options).map_err(zip_error)?;
        if name == DOCUMENT_PART {
            writer.write_all(document_xml.as_bytes()).map_err(zip_error)?;
        } else {
            let mut content = Vec::new();
            entry.read_to_end(&mut content).map_err(zip_error)?;
            writer.write_all(&content).map_err(zip_error)?;
        }
    }

    let cursor = writer.finish().map_err(zip_error)?;
    Ok(cursor.into_inner())
}
