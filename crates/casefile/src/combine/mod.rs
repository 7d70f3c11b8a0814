pub mod docx;
pub mod pdf;

use log::debug;
use tracing::info_span;

use crate::error::ProcessError;
use crate::store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }

    /// Format of an object key or file name, judged by its extension.
    pub fn from_name(name: &str) -> Option<Self> {
        store::extension(name).and_then(|ext| Self::from_extension(&ext))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }
}

/// One input document: its file name (for format detection) and content.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    fn format(&self) -> Result<DocumentFormat, ProcessError> {
        DocumentFormat::from_name(&self.name)
            .ok_or_else(|| ProcessError::UnsupportedFormat(self.name.clone()))
    }
}

#[derive(Debug)]
pub struct CombinedDocument {
    pub bytes: Vec<u8>,
    /// Always PDF.
    pub format: DocumentFormat,
    pub source_count: usize,
}

/// Normalizes one or more PDF/DOCX inputs into a single PDF.
#[derive(Debug, Default)]
pub struct DocumentCombiner;

impl DocumentCombiner {
    pub fn new() -> Self {
        Self
    }

    pub fn combine(&self, inputs: &[SourceDocument]) -> Result<CombinedDocument, ProcessError> {
        let _span = info_span!("combine", inputs = inputs.len()).entered();

        if inputs.is_empty() {
            return Err(ProcessError::EmptyInput);
        }

        let formats = inputs
            .iter()
            .map(SourceDocument::format)
            .collect::<Result<Vec<_>, _>>()?;

        let bytes = if formats.iter().all(|f| *f == DocumentFormat::Docx) {
            debug!("Merging {} DOCX document(s) before conversion", inputs.len());
            let packages: Vec<Vec<u8>> = inputs.iter().map(|d| d.bytes.clone()).collect();
            let merged = docx::merge_docx(&packages)?;
            docx::docx_to_pdf(&merged)?
        } else if inputs.len() == 1 {
            inputs[0].bytes.clone()
        } else {
            let mut pdfs = Vec::with_capacity(inputs.len());
            for (document, format) in inputs.iter().zip(&formats) {
                match format {
                    DocumentFormat::Pdf => pdfs.push(document.bytes.clone()),
                    DocumentFormat::Docx => {
                        debug!("Converting {} to PDF", document.name);
                        pdfs.push(docx::docx_to_pdf(&document.bytes)?);
                    }
                }
            }
            pdf::merge_pdfs(&pdfs)?
        };

        Ok(CombinedDocument {
            bytes,
            format: DocumentFormat::Pdf,
            source_count: inputs.len(),
        })
    }
}
