//! EPUB packaging stage
//!
//! Assembles a standard EPUB 3 container with `zip`: the `mimetype` entry
//! first and stored uncompressed, then the OCF container descriptor, the
//! package document (written with `quick-xml`), a navigation document and one
//! XHTML file per section.

use std::io::{Cursor, Write};

use async_trait::async_trait;
use chrono::Utc;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::error::PackageError;
use super::traits::Packager;
use super::types::{ConversionRequest, Section, PACKAGE_MIME_TYPE};

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// Production packager writing the EPUB into memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct EpubPackager;

impl EpubPackager {
    pub fn new() -> Self {
        EpubPackager
    }

    fn chapter_path(index: usize) -> String {
        format!("OEBPS/chapter_{}.xhtml", index + 1)
    }

    /// Package document (content.opf) with metadata, manifest and spine.
    fn build_opf(request: &ConversionRequest, book_id: &Uuid) -> Result<Vec<u8>, PackageError> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut package = BytesStart::new("package");
        package.push_attribute(("xmlns", "http://www.idpf.org/2007/opf"));
        package.push_attribute(("version", "3.0"));
        package.push_attribute(("unique-identifier", "book-id"));
        writer.write_event(Event::Start(package))?;

        // Metadata
        let mut metadata = BytesStart::new("metadata");
        metadata.push_attribute(("xmlns:dc", "http://purl.org/dc/elements/1.1/"));
        writer.write_event(Event::Start(metadata))?;

        let mut identifier = BytesStart::new("dc:identifier");
        identifier.push_attribute(("id", "book-id"));
        writer.write_event(Event::Start(identifier))?;
        writer.write_event(Event::Text(BytesText::new(&format!("urn:uuid:{}", book_id))))?;
        writer.write_event(Event::End(BytesEnd::new("dc:identifier")))?;

        write_simple_element(&mut writer, "dc:title", &request.title)?;
        write_simple_element(&mut writer, "dc:creator", &request.author)?;
        write_simple_element(&mut writer, "dc:publisher", &request.publisher)?;
        write_simple_element(&mut writer, "dc:language", &request.language)?;

        let mut modified = BytesStart::new("meta");
        modified.push_attribute(("property", "dcterms:modified"));
        writer.write_event(Event::Start(modified))?;
        writer.write_event(Event::Text(BytesText::new(
            &Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        )))?;
        writer.write_event(Event::End(BytesEnd::new("meta")))?;

        writer.write_event(Event::End(BytesEnd::new("metadata")))?;

        // Manifest
        writer.write_event(Event::Start(BytesStart::new("manifest")))?;

        let mut nav_item = BytesStart::new("item");
        nav_item.push_attribute(("id", "nav"));
        nav_item.push_attribute(("href", "nav.xhtml"));
        nav_item.push_attribute(("media-type", "application/xhtml+xml"));
        nav_item.push_attribute(("properties", "nav"));
        writer.write_event(Event::Empty(nav_item))?;

        for index in 0..request.sections.len() {
            let mut item = BytesStart::new("item");
            let id = format!("chapter-{}", index + 1);
            let href = format!("chapter_{}.xhtml", index + 1);
            item.push_attribute(("id", id.as_str()));
            item.push_attribute(("href", href.as_str()));
            item.push_attribute(("media-type", "application/xhtml+xml"));
            writer.write_event(Event::Empty(item))?;
        }

        writer.write_event(Event::End(BytesEnd::new("manifest")))?;

        // Spine
        writer.write_event(Event::Start(BytesStart::new("spine")))?;
        for index in 0..request.sections.len() {
            let mut itemref = BytesStart::new("itemref");
            let idref = format!("chapter-{}", index + 1);
            itemref.push_attribute(("idref", idref.as_str()));
            writer.write_event(Event::Empty(itemref))?;
        }
        writer.write_event(Event::End(BytesEnd::new("spine")))?;

        writer.write_event(Event::End(BytesEnd::new("package")))?;

        Ok(writer.into_inner().into_inner())
    }

    fn build_nav(request: &ConversionRequest) -> String {
        let mut entries = String::new();
        for (index, section) in request.sections.iter().enumerate() {
            entries.push_str(&format!(
                "      <li><a href=\"chapter_{}.xhtml\">{}</a></li>\n",
                index + 1,
                html_escape::encode_text(&section.title),
            ));
        }

        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <!DOCTYPE html>\n\
             <html xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:epub=\"http://www.idpf.org/2007/ops\">\n\
             <head><title>{title}</title></head>\n\
             <body>\n\
             \x20 <nav epub:type=\"toc\">\n\
             \x20   <ol>\n{entries}\x20   </ol>\n\
             \x20 </nav>\n\
             </body>\n\
             </html>\n",
            title = html_escape::encode_text(&request.title),
            entries = entries,
        )
    }

    fn build_chapter(section: &Section) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <!DOCTYPE html>\n\
             <html xmlns=\"http://www.w3.org/1999/xhtml\">\n\
             <head><title>{}</title></head>\n\
             <body>\n{}\n</body>\n\
             </html>\n",
            html_escape::encode_text(&section.title),
            section.body,
        )
    }
}

/// Write `<name>text</name>` with escaped text content.
fn write_simple_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<(), PackageError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[async_trait]
impl Packager for EpubPackager {
    async fn package(&self, request: &ConversionRequest) -> Result<Vec<u8>, PackageError> {
        let book_id = Uuid::new_v4();
        let opf = Self::build_opf(request, &book_id)?;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // The OCF spec requires mimetype to be the first entry, uncompressed.
        zip.start_file("mimetype", stored)?;
        zip.write_all(PACKAGE_MIME_TYPE.as_bytes())?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML.as_bytes())?;

        zip.start_file("OEBPS/content.opf", deflated)?;
        zip.write_all(&opf)?;

        zip.start_file("OEBPS/nav.xhtml", deflated)?;
        zip.write_all(Self::build_nav(request).as_bytes())?;

        for (index, section) in request.sections.iter().enumerate() {
            zip.start_file(Self::chapter_path(index), deflated)?;
            zip.write_all(Self::build_chapter(section).as_bytes())?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn request() -> ConversionRequest {
        ConversionRequest {
            title: "My Book".to_string(),
            author: "Jane Doe".to_string(),
            publisher: "Folio".to_string(),
            language: "en".to_string(),
            sections: vec![Section {
                title: "Chapter 1".to_string(),
                body: "<h1>My Book</h1><p>hi</p>".to_string(),
            }],
        }
    }

    fn entry_string(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut entry = archive.by_name(name).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        content
    }

    #[tokio::test]
    async fn mimetype_is_first_and_stored() {
        let bytes = EpubPackager::new().package(&request()).await.unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
    }

    #[tokio::test]
    async fn container_points_at_package_document() {
        let bytes = EpubPackager::new().package(&request()).await.unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let container = entry_string(&mut archive, "META-INF/container.xml");
        assert!(container.contains("OEBPS/content.opf"));
    }

    #[tokio::test]
    async fn package_document_carries_metadata() {
        let bytes = EpubPackager::new().package(&request()).await.unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let opf = entry_string(&mut archive, "OEBPS/content.opf");
        assert!(opf.contains("<dc:title>My Book</dc:title>"));
        assert!(opf.contains("<dc:creator>Jane Doe</dc:creator>"));
        assert!(opf.contains("<dc:publisher>Folio</dc:publisher>"));
        assert!(opf.contains("<dc:language>en</dc:language>"));
        assert!(opf.contains("urn:uuid:"));
        assert!(opf.contains("idref=\"chapter-1\""));
    }

    #[tokio::test]
    async fn chapter_body_is_embedded_verbatim() {
        let bytes = EpubPackager::new().package(&request()).await.unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        let chapter = entry_string(&mut archive, "OEBPS/chapter_1.xhtml");
        assert!(chapter.contains("<h1>My Book</h1><p>hi</p>"));
    }

    #[tokio::test]
    async fn one_chapter_entry_per_section() {
        let mut req = request();
        req.sections.push(Section {
            title: "Chapter 2".to_string(),
            body: "<p>more</p>".to_string(),
        });

        let bytes = EpubPackager::new().package(&req).await.unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();

        assert!(archive.by_name("OEBPS/chapter_1.xhtml").is_ok());
        assert!(archive.by_name("OEBPS/chapter_2.xhtml").is_ok());
        assert!(archive.by_name("OEBPS/chapter_3.xhtml").is_err());
    }
}
