//! DOCX text extraction.
//!
//! Only paragraphs that sit directly in the document body are read.
//! Paragraphs inside tables, content controls and text boxes are skipped,
//! matching what a document's paragraph list exposes.

use std::path::Path;

use docx_rs::{DocumentChild, Paragraph, ParagraphChild, ReaderError, Run, RunChild};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocxError {
    #[error("not a valid DOCX file: {0}")]
    Invalid(String),
    #[error("DOCX file has no main document part")]
    MissingDocument,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ReaderError> for DocxError {
    fn from(e: ReaderError) -> Self {
        match e {
            ReaderError::DocumentNotFoundError => DocxError::MissingDocument,
            other => DocxError::Invalid(other.to_string()),
        }
    }
}

/// Extract the text of a DOCX file: each body paragraph followed by `\n`.
pub fn extract_text(path: &Path) -> Result<String, DocxError> {
    let bytes = std::fs::read(path)?;
    text_from_bytes(&bytes)
}

/// Same as [`extract_text`], for a DOCX file already in memory.
pub fn text_from_bytes(bytes: &[u8]) -> Result<String, DocxError> {
    let docx = docx_rs::read_docx(bytes)?;

    let mut text = String::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(para) = child {
            push_paragraph(&mut text, para);
            text.push('\n');
        }
    }
    Ok(text)
}

fn push_paragraph(out: &mut String, para: &Paragraph) {
    for child in &para.children {
        match child {
            ParagraphChild::Run(run) => push_run(out, run),
            ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    if let ParagraphChild::Run(run) = inner {
                        push_run(out, run);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_run(out: &mut String, run: &Run) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}
