//! DOCX extraction stage
//!
//! Delegates parsing to `docx-rs` and walks the document tree into an HTML
//! body string: paragraphs (heading styles map to `<h1>`..`<h6>`), character
//! runs (bold/italic), and tables. Images, footnotes and numbering are
//! dropped; the pipeline only carries flowing text into the package.

use async_trait::async_trait;

use super::error::ExtractError;
use super::traits::Extractor;

/// Production extractor backed by `docx_rs::read_docx`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxExtractor;

impl DocxExtractor {
    pub fn new() -> Self {
        DocxExtractor
    }

    fn render_document(docx: &docx_rs::Docx) -> String {
        let mut html = String::new();

        for child in &docx.document.children {
            match child {
                docx_rs::DocumentChild::Paragraph(para) => {
                    Self::push_paragraph_html(para, &mut html);
                }
                docx_rs::DocumentChild::Table(table) => {
                    Self::push_table_html(table, &mut html);
                }
                _ => {}
            }
        }

        html
    }

    /// Block tag for a paragraph, from its named style.
    fn paragraph_tag(para: &docx_rs::Paragraph) -> &'static str {
        match para.property.style.as_ref().map(|s| s.val.as_str()) {
            Some("Title") | Some("Heading1") => "h1",
            Some("Heading2") => "h2",
            Some("Heading3") => "h3",
            Some("Heading4") => "h4",
            Some("Heading5") => "h5",
            Some("Heading6") => "h6",
            _ => "p",
        }
    }

    fn push_paragraph_html(para: &docx_rs::Paragraph, out: &mut String) {
        let inline = Self::paragraph_inline_html(para);
        if inline.is_empty() {
            return;
        }

        let tag = Self::paragraph_tag(para);
        out.push('<');
        out.push_str(tag);
        out.push('>');
        out.push_str(&inline);
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }

    /// Inline content of a paragraph. Hyperlinks and tracked insertions are
    /// flattened to their runs; tracked deletions are dropped.
    fn paragraph_inline_html(para: &docx_rs::Paragraph) -> String {
        let mut inline = String::new();
        for child in &para.children {
            match child {
                docx_rs::ParagraphChild::Run(run) => {
                    Self::push_run_html(run, &mut inline);
                }
                docx_rs::ParagraphChild::Hyperlink(hyperlink) => {
                    for nested in &hyperlink.children {
                        if let docx_rs::ParagraphChild::Run(run) = nested {
                            Self::push_run_html(run, &mut inline);
                        }
                    }
                }
                docx_rs::ParagraphChild::Insert(insert) => {
                    for nested in &insert.children {
                        if let docx_rs::InsertChild::Run(run) = nested {
                            Self::push_run_html(run, &mut inline);
                        }
                    }
                }
                _ => {}
            }
        }
        inline
    }

    fn push_run_html(run: &docx_rs::Run, out: &mut String) {
        let mut text = String::new();
        for child in &run.children {
            match child {
                docx_rs::RunChild::Text(t) => {
                    text.push_str(&html_escape::encode_text(&t.text));
                }
                docx_rs::RunChild::Tab(_) => {
                    text.push('\t');
                }
                docx_rs::RunChild::Break(_) => {
                    text.push_str("<br/>");
                }
                _ => {}
            }
        }

        if text.is_empty() {
            return;
        }

        let bold = run.run_property.bold.is_some();
        let italic = run.run_property.italic.is_some();

        if bold {
            out.push_str("<strong>");
        }
        if italic {
            out.push_str("<em>");
        }
        out.push_str(&text);
        if italic {
            out.push_str("</em>");
        }
        if bold {
            out.push_str("</strong>");
        }
    }

    fn push_table_html(table: &docx_rs::Table, out: &mut String) {
        out.push_str("<table>");
        for row_child in &table.rows {
            #[allow(irrefutable_let_patterns)]
            let docx_rs::TableChild::TableRow(row) = row_child
            else {
                continue;
            };
            out.push_str("<tr>");
            for cell_child in &row.cells {
                #[allow(irrefutable_let_patterns)]
                let docx_rs::TableRowChild::TableCell(cell) = cell_child
                else {
                    continue;
                };
                out.push_str("<td>");
                let mut first = true;
                for content in &cell.children {
                    if let docx_rs::TableCellContent::Paragraph(para) = content {
                        let inline = Self::paragraph_inline_html(para);
                        if inline.is_empty() {
                            continue;
                        }
                        if !first {
                            out.push_str("<br/>");
                        }
                        out.push_str(&inline);
                        first = false;
                    }
                }
                out.push_str("</td>");
            }
            out.push_str("</tr>");
        }
        out.push_str("</table>");
    }
}

#[async_trait]
impl Extractor for DocxExtractor {
    async fn extract(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let docx =
            docx_rs::read_docx(bytes).map_err(|e| ExtractError::Malformed(format!("{:?}", e)))?;

        Ok(Self::render_document(&docx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};

    fn pack(docx: Docx) -> Vec<u8> {
        let mut cursor = std::io::Cursor::new(Vec::new());
        docx.build().pack(&mut cursor).unwrap();
        cursor.into_inner()
    }

    #[tokio::test]
    async fn extracts_paragraphs_and_headings() {
        let docx = Docx::new()
            .add_paragraph(
                Paragraph::new()
                    .style("Heading1")
                    .add_run(Run::new().add_text("Introduction")),
            )
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Plain text.")));

        let html = DocxExtractor::new().extract(&pack(docx)).await.unwrap();

        assert!(html.contains("<h1>Introduction</h1>"));
        assert!(html.contains("<p>Plain text.</p>"));
    }

    #[tokio::test]
    async fn renders_bold_and_italic_runs() {
        let docx = Docx::new().add_paragraph(
            Paragraph::new()
                .add_run(Run::new().add_text("loud").bold())
                .add_run(Run::new().add_text(" and "))
                .add_run(Run::new().add_text("slanted").italic()),
        );

        let html = DocxExtractor::new().extract(&pack(docx)).await.unwrap();

        assert!(html.contains("<strong>loud</strong>"));
        assert!(html.contains("<em>slanted</em>"));
    }

    #[tokio::test]
    async fn escapes_markup_in_text() {
        let docx = Docx::new()
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("1 < 2 & 3 > 2")));

        let html = DocxExtractor::new().extract(&pack(docx)).await.unwrap();

        assert!(html.contains("1 &lt; 2 &amp; 3 &gt; 2"));
        assert!(!html.contains("1 < 2"));
    }

    #[tokio::test]
    async fn skips_empty_paragraphs() {
        let docx = Docx::new()
            .add_paragraph(Paragraph::new())
            .add_paragraph(Paragraph::new().add_run(Run::new().add_text("only me")));

        let html = DocxExtractor::new().extract(&pack(docx)).await.unwrap();

        assert_eq!(html, "<p>only me</p>");
    }

    #[tokio::test]
    async fn rejects_garbage_bytes() {
        let result = DocxExtractor::new().extract(b"definitely not a docx").await;

        assert!(matches!(result, Err(ExtractError::Malformed(_))));
    }
}
