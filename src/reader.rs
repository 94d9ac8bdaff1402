//! Paragraph text extraction from DOCX packages
//!
//! This module opens the ZIP container, locates the main document part and
//! streams its WordprocessingML to collect paragraph text in document order.

use crate::DocxError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

/// Main document part when the package relationships don't name one
const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";

/// Package-level relationships
const PACKAGE_RELS_PART: &str = "_rels/.rels";

/// Options for paragraph collection
#[derive(Debug, Clone, Default)]
pub struct ReaderOptions {
    /// Also collect paragraphs inside table cells (default: false, body
    /// paragraphs only)
    pub include_tables: bool,
}

/// Read the paragraphs of a DOCX file
pub fn read_paragraphs<P: AsRef<Path>>(
    path: P,
    options: &ReaderOptions,
) -> Result<Vec<String>, DocxError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    paragraphs_from_archive(&mut archive, options)
}

/// Read the paragraphs of a DOCX held in memory
pub fn read_paragraphs_mem(
    buffer: &[u8],
    options: &ReaderOptions,
) -> Result<Vec<String>, DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(buffer))?;
    paragraphs_from_archive(&mut archive, options)
}

/// Read a DOCX file as plain text, one paragraph per line
pub fn read_text<P: AsRef<Path>>(path: P, options: &ReaderOptions) -> Result<String, DocxError> {
    Ok(read_paragraphs(path, options)?.join("\n"))
}

/// Read an in-memory DOCX as plain text, one paragraph per line
pub fn read_text_mem(buffer: &[u8], options: &ReaderOptions) -> Result<String, DocxError> {
    Ok(read_paragraphs_mem(buffer, options)?.join("\n"))
}

fn paragraphs_from_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    options: &ReaderOptions,
) -> Result<Vec<String>, DocxError> {
    let part_name = main_document_part(archive)?;
    let xml = read_part(archive, &part_name)?.ok_or(DocxError::MissingDocumentPart)?;
    let paragraphs = parse_paragraphs(&xml, options)?;

    log::debug!("{}: {} paragraphs", part_name, paragraphs.len());
    Ok(paragraphs)
}

/// Read a part as UTF-8, or `None` if the archive doesn't contain it
fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, DocxError> {
    let mut part = match archive.by_name(name) {
        Ok(part) => part,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut content = String::new();
    part.read_to_string(&mut content)?;
    Ok(Some(content))
}

/// Resolve the main document part through the package relationships
fn main_document_part<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String, DocxError> {
    let target = match read_part(archive, PACKAGE_RELS_PART)? {
        Some(rels) => office_document_target(&rels)?,
        None => None,
    };

    Ok(target.unwrap_or_else(|| DEFAULT_DOCUMENT_PART.to_string()))
}

/// Find the target of the `officeDocument` relationship in a `.rels` part
fn office_document_target(rels: &str) -> Result<Option<String>, DocxError> {
    let mut reader = Reader::from_str(rels);

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut rel_type = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    match attr.key.local_name().as_ref() {
                        b"Type" => rel_type = Some(attr.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                if let (Some(rel_type), Some(target)) = (rel_type, target) {
                    if rel_type.ends_with("/officeDocument") {
                        return Ok(Some(target.trim_start_matches('/').to_string()));
                    }
                }
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}

/// Paragraph currently being collected
struct OpenParagraph {
    text: String,
    /// Depth of `w:p` elements opened inside this one (text boxes)
    nested: usize,
}

/// Collect paragraph text from a WordprocessingML document part
///
/// Only `w:p` elements directly under `w:body` count as paragraphs, plus
/// table-cell paragraphs when `include_tables` is set. Paragraphs nested
/// inside another paragraph contribute nothing.
pub fn parse_paragraphs(xml: &str, options: &ReaderOptions) -> Result<Vec<String>, DocxError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut current: Option<OpenParagraph> = None;
    let mut paragraphs = Vec::new();
    let mut saw_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                saw_root = true;
                let name = e.local_name().as_ref().to_vec();
                if name == b"p" {
                    match current.as_mut() {
                        Some(open) => open.nested += 1,
                        None if accepts_paragraph(&stack, options) => {
                            current = Some(OpenParagraph {
                                text: String::new(),
                                nested: 0,
                            });
                        }
                        None => {}
                    }
                } else if let Some(open) = current.as_mut().filter(|open| open.nested == 0) {
                    push_run_content(&mut open.text, &name, &e, &stack);
                }
                stack.push(name);
            }
            Event::Empty(e) => {
                saw_root = true;
                let name = e.local_name();
                if name.as_ref() == b"p" {
                    if current.is_none() && accepts_paragraph(&stack, options) {
                        paragraphs.push(String::new());
                    }
                } else if let Some(open) = current.as_mut().filter(|open| open.nested == 0) {
                    push_run_content(&mut open.text, name.as_ref(), &e, &stack);
                }
            }
            Event::End(e) => {
                stack.pop();
                if e.local_name().as_ref() == b"p" {
                    if let Some(mut open) = current.take() {
                        if open.nested > 0 {
                            open.nested -= 1;
                            current = Some(open);
                        } else {
                            paragraphs.push(open.text);
                        }
                    }
                }
            }
            Event::Text(t) => {
                if let Some(open) = current.as_mut().filter(|open| open.nested == 0) {
                    if is_run_text(&stack) {
                        open.text.push_str(&t.unescape()?);
                    }
                }
            }
            Event::Eof => {
                if !saw_root {
                    return Err(DocxError::Xml("document part has no root element".into()));
                }
                if let Some(open) = stack.last() {
                    return Err(DocxError::Xml(format!(
                        "unexpected end of document part inside <{}>",
                        String::from_utf8_lossy(open)
                    )));
                }
                break;
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

/// Containers whose runs are not part of the visible paragraph text:
/// deleted and moved-away revisions, and equations
const SKIPPED_CONTAINERS: [&[u8]; 4] = [b"del", b"moveFrom", b"oMath", b"oMathPara"];

fn in_skipped_container(stack: &[Vec<u8>]) -> bool {
    stack
        .iter()
        .any(|name| SKIPPED_CONTAINERS.contains(&name.as_slice()))
}

/// Whether the innermost open element is a `t` directly inside a run
fn is_run_text(stack: &[Vec<u8>]) -> bool {
    match stack {
        [.., run, text] => run == b"r" && text == b"t" && !in_skipped_container(stack),
        _ => false,
    }
}

fn accepts_paragraph(stack: &[Vec<u8>], options: &ReaderOptions) -> bool {
    match stack.last() {
        Some(parent) if parent == b"body" => true,
        _ => options.include_tables && stack.iter().any(|n| n == b"tc"),
    }
}

/// Append the text equivalent of a run-level element
fn push_run_content(text: &mut String, name: &[u8], e: &BytesStart, stack: &[Vec<u8>]) {
    if stack.last().map(|p| p.as_slice()) != Some(b"r".as_slice()) || in_skipped_container(stack)
    {
        return;
    }

    match name {
        b"tab" | b"ptab" => text.push('\t'),
        b"cr" => text.push('\n'),
        b"br" if is_text_wrapping_break(e) => text.push('\n'),
        b"noBreakHyphen" => text.push('-'),
        _ => {}
    }
}

/// Line breaks have no type or `textWrapping`; page and column breaks don't
/// produce text
fn is_text_wrapping_break(e: &BytesStart) -> bool {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"type")
        .map(|attr| attr.value.as_ref() == b"textWrapping")
        .unwrap_or(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
            inner
        )
    }

    fn parse(inner: &str) -> Vec<String> {
        parse_paragraphs(&body(inner), &ReaderOptions::default()).unwrap()
    }

    #[test]
    fn test_runs_are_concatenated() {
        let paragraphs = parse(
            r#"<w:p><w:r><w:t>Tar</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>get1</w:t></w:r></w:p>"#,
        );
        assert_eq!(paragraphs, vec!["Target1"]);
    }

    #[test]
    fn test_empty_paragraphs() {
        let paragraphs = parse(r#"<w:p/><w:p><w:pPr/></w:p><w:p><w:r><w:t>x</w:t></w:r></w:p>"#);
        assert_eq!(paragraphs, vec!["", "", "x"]);
    }

    #[test]
    fn test_tabs_and_breaks() {
        let paragraphs = parse(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>a</w:t><w:tab/><w:t>b</w:t><w:br/><w:t>c</w:t><w:br w:type="page"/><w:t>d</w:t><w:cr/><w:noBreakHyphen/></w:r></w:p>"#,
        );
        assert_eq!(paragraphs, vec!["a\tb\ncd\n-"]);
    }

    #[test]
    fn test_entities_and_spaces() {
        let paragraphs = parse(
            r#"<w:p><w:r><w:t xml:space="preserve">Center: 1 m; 2 m; 3 m &amp; more </w:t></w:r></w:p>"#,
        );
        assert_eq!(paragraphs, vec!["Center: 1 m; 2 m; 3 m & more "]);
    }

    #[test]
    fn test_hyperlink_runs() {
        let paragraphs = parse(
            r#"<w:p><w:r><w:t>see </w:t></w:r><w:hyperlink r:id="rId5"><w:r><w:t>Target9</w:t></w:r></w:hyperlink></w:p>"#,
        );
        assert_eq!(paragraphs, vec!["see Target9"]);
    }

    #[test]
    fn test_deleted_text_ignored() {
        let paragraphs = parse(
            r#"<w:p><w:del><w:r><w:delText>Target1</w:delText></w:r></w:del><w:r><w:t>Target2</w:t></w:r></w:p>"#,
        );
        assert_eq!(paragraphs, vec!["Target2"]);
    }

    #[test]
    fn test_moved_and_math_text_ignored() {
        let paragraphs = parse(
            r#"<w:p><w:moveFrom><w:r><w:t>Target1</w:t><w:tab/></w:r></w:moveFrom><w:moveTo><w:r><w:t>Target1</w:t></w:r></w:moveTo><m:oMath><m:r><m:t>x=2</m:t></m:r></m:oMath></w:p>"#,
        );
        assert_eq!(paragraphs, vec!["Target1"]);
    }

    #[test]
    fn test_truncated_part_rejected() {
        let xml = r#"<w:document><w:body><w:p><w:r><w:t>Target1</w:t></w:r></w:p><w:p><w:r><w:t>Center: 1 m; 2 m; 3 m</w:t></w:r></w:p><w:p><w:r><w:t>Target2"#;
        let result = parse_paragraphs(xml, &ReaderOptions::default());
        assert!(matches!(result, Err(DocxError::Xml(_))));
    }

    #[test]
    fn test_empty_part_rejected() {
        for xml in ["", "<?xml version=\"1.0\"?>\n"] {
            let result = parse_paragraphs(xml, &ReaderOptions::default());
            assert!(matches!(result, Err(DocxError::Xml(_))));
        }
    }

    #[test]
    fn test_text_box_paragraphs_skipped() {
        let paragraphs = parse(
            r#"<w:p><w:r><w:t>outer</w:t></w:r><w:r><w:pict><v:shape><v:textbox><w:txbxContent><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:txbxContent></v:textbox></v:shape></w:pict></w:r><w:r><w:t> end</w:t></w:r></w:p>"#,
        );
        assert_eq!(paragraphs, vec!["outer end"]);
    }

    #[test]
    fn test_tables_optional() {
        let xml = body(
            r#"<w:p><w:r><w:t>before</w:t></w:r></w:p><w:tbl><w:tr><w:tc><w:p><w:r><w:t>cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl><w:p><w:r><w:t>after</w:t></w:r></w:p>"#,
        );

        let body_only = parse_paragraphs(&xml, &ReaderOptions::default()).unwrap();
        assert_eq!(body_only, vec!["before", "after"]);

        let with_tables = parse_paragraphs(
            &xml,
            &ReaderOptions {
                include_tables: true,
            },
        )
        .unwrap();
        assert_eq!(with_tables, vec!["before", "cell", "after"]);
    }

    #[test]
    fn test_malformed_xml() {
        let result = parse_paragraphs(
            "<w:document><w:body><w:p></w:r></w:body></w:document>",
            &ReaderOptions::default(),
        );
        assert!(matches!(result, Err(DocxError::Xml(_))));
    }

    #[test]
    fn test_office_document_target() {
        let rels = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="/word/document2.xml"/></Relationships>"#;
        assert_eq!(
            office_document_target(rels).unwrap(),
            Some("word/document2.xml".to_string())
        );
        assert_eq!(office_document_target("<Relationships/>").unwrap(), None);
    }
}
