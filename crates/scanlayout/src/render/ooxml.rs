//! Office Open XML packaging shared by the docx and xlsx renderers.
//!
//! Parts are written as `quick_xml` events into an in-memory zip archive.

use crate::{Result, ScanLayoutError};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use std::borrow::Cow;
use std::io::{self, Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub(crate) type XmlWriter = Writer<Vec<u8>>;

const PACKAGE_RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NS: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

pub(crate) const RELATIONSHIP_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub(crate) const RELATIONSHIP_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub(crate) const RELATIONSHIP_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";

/// An in-memory zip package being assembled.
pub(crate) struct Package {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    format: &'static str,
}

impl Package {
    pub(crate) fn new(format: &'static str) -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            format,
        }
    }

    pub(crate) fn add(&mut self, name: &str, content: &[u8]) -> Result<()> {
        self.zip
            .start_file(name, SimpleFileOptions::default())
            .map_err(|e| ScanLayoutError::render_with_source(self.format, format!("cannot add {name}"), e))?;
        self.zip
            .write_all(content)
            .map_err(|e| ScanLayoutError::render_with_source(self.format, format!("cannot write {name}"), e))?;
        Ok(())
    }

    /// Add an XML part whose root element is written by `body`.
    pub(crate) fn add_xml<F>(&mut self, name: &str, body: F) -> Result<()>
    where
        F: FnOnce(&mut XmlWriter) -> io::Result<()>,
    {
        let content = xml_part(body)
            .map_err(|e| ScanLayoutError::render_with_source(self.format, format!("cannot serialize {name}"), e))?;
        self.add(name, &content)
    }

    pub(crate) fn finish(self) -> Result<Vec<u8>> {
        let format = self.format;
        let cursor = self
            .zip
            .finish()
            .map_err(|e| ScanLayoutError::render_with_source(format, "cannot finish package", e))?;
        Ok(cursor.into_inner())
    }
}

/// Serialize one part: the standalone declaration followed by `body`.
pub(crate) fn xml_part<F>(body: F) -> io::Result<Vec<u8>>
where
    F: FnOnce(&mut XmlWriter) -> io::Result<()>,
{
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    body(&mut writer)?;
    Ok(writer.into_inner())
}

/// `<name attrs.../>`
pub(crate) fn empty(writer: &mut XmlWriter, name: &str, attributes: &[(&str, &str)]) -> io::Result<()> {
    writer
        .create_element(name)
        .with_attributes(attributes.iter().copied())
        .write_empty()?;
    Ok(())
}

/// `<name attrs...>text</name>`, with the text escaped and stripped of
/// characters XML cannot carry.
pub(crate) fn text_element(writer: &mut XmlWriter, name: &str, attributes: &[(&str, &str)], text: &str) -> io::Result<()> {
    writer
        .create_element(name)
        .with_attributes(attributes.iter().copied())
        .write_text_content(BytesText::new(&xml_safe(text)))?;
    Ok(())
}

/// A relationships part. Ids are `rId1`, `rId2`, ... in `targets` order;
/// each entry is a relationship type and its target.
pub(crate) fn write_relationships(writer: &mut XmlWriter, targets: &[(&str, String)]) -> io::Result<()> {
    writer
        .create_element("Relationships")
        .with_attribute(("xmlns", PACKAGE_RELATIONSHIPS_NS))
        .write_inner_content(|w| {
            for (i, (kind, target)) in targets.iter().enumerate() {
                let id = format!("rId{}", i + 1);
                empty(w, "Relationship", &[("Id", id.as_str()), ("Type", *kind), ("Target", target.as_str())])?;
            }
            Ok(())
        })?;
    Ok(())
}

/// `[Content_Types].xml` with the rels/xml defaults and one override per
/// `(part name, content type)`.
pub(crate) fn write_content_types(writer: &mut XmlWriter, overrides: &[(String, &str)]) -> io::Result<()> {
    writer
        .create_element("Types")
        .with_attribute(("xmlns", CONTENT_TYPES_NS))
        .write_inner_content(|w| {
            empty(
                w,
                "Default",
                &[
                    ("Extension", "rels"),
                    ("ContentType", "application/vnd.openxmlformats-package.relationships+xml"),
                ],
            )?;
            empty(w, "Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
            for (part, content_type) in overrides {
                empty(w, "Override", &[("PartName", part.as_str()), ("ContentType", *content_type)])?;
            }
            Ok(())
        })?;
    Ok(())
}

/// Drop characters XML 1.0 cannot carry. Recognizer output occasionally
/// contains form feeds and other control characters.
pub(crate) fn xml_safe(text: &str) -> Cow<'_, str> {
    let valid = |c: char| matches!(c, '\t' | '\n' | '\r') || c >= ' ';
    if text.chars().all(valid) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|&c| valid(c)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn part<F>(body: F) -> String
    where
        F: FnOnce(&mut XmlWriter) -> io::Result<()>,
    {
        String::from_utf8(xml_part(body).unwrap()).unwrap()
    }

    #[test]
    fn test_text_element_escapes_markup() {
        let xml = part(|w| text_element(w, "t", &[], "a < b & c"));
        assert!(xml.ends_with("<t>a &lt; b &amp; c</t>"), "{xml}");
    }

    #[test]
    fn test_text_element_drops_control_characters() {
        let xml = part(|w| text_element(w, "t", &[("xml:space", "preserve")], "page\u{c}end\u{1}"));
        assert!(xml.ends_with(r#"<t xml:space="preserve">pageend</t>"#), "{xml}");
        assert_eq!(xml_safe("tab\tkept"), "tab\tkept");
    }

    #[test]
    fn test_part_starts_with_declaration() {
        let xml = part(|w| empty(w, "a", &[("k", "v\"q")]));
        assert_eq!(
            xml,
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><a k="v&quot;q"/>"#
        );
    }

    #[test]
    fn test_relationship_ids_follow_order() {
        let xml = part(|w| {
            write_relationships(
                w,
                &[
                    (RELATIONSHIP_WORKSHEET, "worksheets/sheet1.xml".to_string()),
                    (RELATIONSHIP_STYLES, "styles.xml".to_string()),
                ],
            )
        });
        assert!(xml.contains(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#));
        assert!(xml.contains(r#"Id="rId2""#));
        assert!(xml.contains(r#"Target="styles.xml""#));
    }

    #[test]
    fn test_package_round_trip() {
        let mut package = Package::new("docx");
        package.add_xml("a.xml", |w| empty(w, "a", &[])).unwrap();
        let bytes = package.finish().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut content = String::new();
        archive.by_name("a.xml").unwrap().read_to_string(&mut content).unwrap();
        assert!(content.ends_with("<a/>"));
    }
}
