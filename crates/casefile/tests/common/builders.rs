//! Builders for folder contents.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use casefile::combine::pdf::render_text_pdf;
use casefile::record::CaseRecord;

pub fn record_json(subject: &str, body: &str) -> Vec<u8> {
    CaseRecord::new(subject, body).to_json().unwrap()
}

pub fn pdf(text: &str) -> Vec<u8> {
    render_text_pdf(text).unwrap()
}

/// Minimal word-processing package with one run per paragraph.
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        body
    );

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    writer.start_file("[Content_Types].xml", options).unwrap();
    writer.write_all(b"<Types/>").unwrap();
    writer.start_file("word/document.xml", options).unwrap();
    writer.write_all(document.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Folder contents keyed by name relative to the folder.
#[derive(Default)]
pub struct FolderBuilder {
    pub files: Vec<(String, Vec<u8>)>,
}

impl FolderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(self, subject: &str) -> Self {
        self.file("email.json", record_json(subject, "Please see the attached documents."))
    }

    pub fn pdf(self, name: &str, text: &str) -> Self {
        self.file(name, pdf(text))
    }

    pub fn docx(self, name: &str, paragraphs: &[&str]) -> Self {
        self.file(name, docx(paragraphs))
    }

    pub fn file(mut self, name: &str, bytes: Vec<u8>) -> Self {
        self.files.push((name.to_string(), bytes));
        self
    }
}
