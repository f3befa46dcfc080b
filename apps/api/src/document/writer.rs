use std::io::{self, Write};

use crate::document::{Block, OutputDocument};

/// Serializes a document to bytes for the archive.
pub trait DocumentWriter: Send + Sync {
    /// File extension for archive entries, without the dot.
    fn extension(&self) -> &'static str;

    fn write(&self, document: &OutputDocument) -> io::Result<Vec<u8>>;
}

/// Writes documents as Markdown: the title is `#`, section headings `##`,
/// and every paragraph is separated by a blank line.
pub struct MarkdownWriter;

impl DocumentWriter for MarkdownWriter {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn write(&self, document: &OutputDocument) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        for block in document.blocks() {
            match block {
                Block::Heading { level, text } => {
                    let hashes = "#".repeat(usize::from(level) + 1);
                    writeln!(out, "{hashes} {text}\n")?;
                }
                Block::Paragraph(text) => writeln!(out, "{text}\n")?,
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{assemble_document, DocumentKind};

    #[test]
    fn test_markdown_writer_renders_title_and_headings() {
        let document = assemble_document("a@x.com", DocumentKind::Exam, vec![]);
        let bytes = MarkdownWriter.write(&document).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "# Pediatric Shelf Examination for a@x.com\n\n");
    }
}
