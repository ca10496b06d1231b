//! Document Extractor: turns an uploaded PDF or DOCX into a plain-text transcript.

use std::panic::{self, AssertUnwindSafe};

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};
use thiserror::Error;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("document could not be decoded: {0}")]
    CorruptDocument(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

impl DocumentKind {
    /// Resolves the declared media type. Parameters such as `; charset=binary`
    /// are ignored. When nothing useful is declared the file extension decides.
    pub fn resolve(declared: Option<&str>, file_name: &str) -> Result<Self, ExtractError> {
        let essence = declared
            .and_then(|m| m.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty() && m != "application/octet-stream");

        match essence.as_deref() {
            Some(PDF_MEDIA_TYPE) => Ok(DocumentKind::Pdf),
            Some(DOCX_MEDIA_TYPE) => Ok(DocumentKind::Docx),
            Some(other) => Err(ExtractError::UnsupportedFormat(other.to_string())),
            None => Self::from_extension(file_name),
        }
    }

    fn from_extension(file_name: &str) -> Result<Self, ExtractError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "pdf" => Ok(DocumentKind::Pdf),
            "docx" => Ok(DocumentKind::Docx),
            _ => Err(ExtractError::UnsupportedFormat(format!(
                "unrecognised file `{file_name}`"
            ))),
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            DocumentKind::Pdf => PDF_MEDIA_TYPE,
            DocumentKind::Docx => DOCX_MEDIA_TYPE,
        }
    }
}

/// Extracts a best-effort transcript in the decoder's reading order.
///
/// CPU-bound; callers on the async runtime should go through `spawn_blocking`.
/// A document that decodes but yields no text is reported as corrupt.
pub fn extract_text(bytes: &[u8], kind: DocumentKind) -> Result<String, ExtractError> {
    let text = match kind {
        DocumentKind::Pdf => extract_pdf(bytes)?,
        DocumentKind::Docx => extract_docx(bytes)?,
    };

    if text.trim().is_empty() {
        return Err(ExtractError::CorruptDocument(
            "no extractable text".to_string(),
        ));
    }
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed font tables.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match outcome {
        Ok(Ok(text)) => Ok(text.replace('\0', "")),
        Ok(Err(e)) => Err(ExtractError::CorruptDocument(e.to_string())),
        Err(_) => Err(ExtractError::CorruptDocument(
            "PDF decoder aborted".to_string(),
        )),
    }
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = docx_rs::read_docx(bytes)
        .map_err(|e| ExtractError::CorruptDocument(e.to_string()))?;

    let mut text = String::new();
    for child in &doc.document.children {
        match child {
            DocumentChild::Paragraph(p) => push_paragraph(&mut text, p),
            DocumentChild::Table(t) => push_table(&mut text, t),
            _ => {}
        }
    }
    Ok(text)
}

fn push_paragraph(out: &mut String, paragraph: &Paragraph) {
    push_paragraph_children(out, &paragraph.children);
    out.push('\n');
}

fn push_paragraph_children(out: &mut String, children: &[ParagraphChild]) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            // Emails and portfolio links usually live inside hyperlinks.
            ParagraphChild::Hyperlink(link) => push_paragraph_children(out, &link.children),
            _ => {}
        }
    }
}

#[allow(irrefutable_let_patterns)]
fn push_table(out: &mut String, table: &Table) {
    for row_child in &table.rows {
        let TableChild::TableRow(row) = row_child else {
            continue;
        };
        let mut cells = Vec::new();
        for cell_child in &row.cells {
            let TableRowChild::TableCell(cell) = cell_child else {
                continue;
            };
            let mut cell_text = String::new();
            for content in &cell.children {
                if let TableCellContent::Paragraph(p) = content {
                    push_paragraph_children(&mut cell_text, &p.children);
                    cell_text.push(' ');
                }
            }
            cells.push(cell_text.trim().to_string());
        }
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
}
