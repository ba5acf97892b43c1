use crate::error::TakeoffError;
use crate::extraction::{PageWords, PositionedWord, WordExtractor};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::process::Command;

/// Word extraction backend using `pdftotext -bbox` (from poppler-utils).
///
/// Coordinates come back in PDF points with a top-left origin.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl WordExtractor for PdftotextExtractor {
    fn extract_words(&self, pdf_bytes: &[u8], page: usize) -> Result<PageWords, TakeoffError> {
        if page == 0 {
            return Err(TakeoffError::PageOutOfRange { page });
        }

        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| TakeoffError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| TakeoffError::Extraction(e.to_string()))?;

        let page_arg = page.to_string();
        let output = Command::new("pdftotext")
            .arg("-bbox")
            .arg("-f")
            .arg(&page_arg)
            .arg("-l")
            .arg(&page_arg)
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TakeoffError::PdftotextNotFound
                } else {
                    TakeoffError::Extraction(format!("pdftotext -bbox failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(TakeoffError::PdftotextFailed { code, stderr });
        }

        let xml = String::from_utf8_lossy(&output.stdout);
        let mut pages = parse_bbox_xml(&xml)?;
        if pages.is_empty() {
            return Err(TakeoffError::PageOutOfRange { page });
        }
        let mut words = pages.swap_remove(0);
        words.page_number = page;
        Ok(words)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Parse `pdftotext -bbox` XHTML into one `PageWords` per `<page>`.
fn parse_bbox_xml(xml: &str) -> Result<Vec<PageWords>, TakeoffError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages: Vec<PageWords> = Vec::new();
    let mut current_word: Option<PositionedWord> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(e) if e.name().as_ref() == b"page" => {
                pages.push(parse_page(&e, pages.len() + 1)?);
            }
            Event::Empty(e) if e.name().as_ref() == b"page" => {
                pages.push(parse_page(&e, pages.len() + 1)?);
            }
            Event::Start(e) if e.name().as_ref() == b"word" => {
                current_word = parse_word_box(&e)?;
            }
            Event::Text(t) => {
                if let Some(word) = current_word.as_mut() {
                    let text = t.unescape().map_err(xml_error)?;
                    word.text.push_str(text.trim());
                }
            }
            Event::End(e) if e.name().as_ref() == b"word" => {
                if let (Some(word), Some(page)) = (current_word.take(), pages.last_mut()) {
                    if !word.text.is_empty() {
                        page.words.push(word);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages)
}

fn parse_page(tag: &BytesStart, page_number: usize) -> Result<PageWords, TakeoffError> {
    Ok(PageWords {
        page_number,
        page_width: attr_f64(tag, "width")?.unwrap_or(0.0),
        page_height: attr_f64(tag, "height")?.unwrap_or(0.0),
        words: Vec::new(),
    })
}

fn parse_word_box(tag: &BytesStart) -> Result<Option<PositionedWord>, TakeoffError> {
    let (Some(x_min), Some(y_min), Some(x_max), Some(y_max)) = (
        attr_f64(tag, "xMin")?,
        attr_f64(tag, "yMin")?,
        attr_f64(tag, "xMax")?,
        attr_f64(tag, "yMax")?,
    ) else {
        return Ok(None);
    };
    Ok(Some(PositionedWord::new(
        String::new(),
        x_min,
        y_min,
        x_max - x_min,
        y_max - y_min,
    )))
}

fn attr_f64(tag: &BytesStart, name: &str) -> Result<Option<f64>, TakeoffError> {
    let attr = tag
        .try_get_attribute(name)
        .map_err(|e| TakeoffError::Extraction(format!("bad attribute in bbox output: {}", e)))?;
    match attr {
        Some(a) => {
            let value = a.unescape_value().map_err(xml_error)?;
            Ok(value.trim().parse().ok())
        }
        None => Ok(None),
    }
}

fn xml_error(e: quick_xml::Error) -> TakeoffError {
    TakeoffError::Extraction(format!("malformed bbox output: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BBOX_XML: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<title></title>
<meta name="Producer" content="AutoCAD PDF"/>
</head>
<body>
<doc>
  <page width="3370.000000" height="2384.000000">
    <word xMin="100.000000" yMin="200.000000" xMax="125.000000" yMax="208.000000">NEW</word>
    <word xMin="128.000000" yMin="200.000000" xMax="146.000000" yMax="208.000000">100</word>
    <word xMin="150.000000" yMin="200.500000" xMax="162.000000" yMax="208.000000">LV</word>
    <word xMin="10.000000" yMin="20.000000" xMax="30.000000" yMax="28.000000">R&amp;D</word>
  </page>
</doc>
</body>
</html>
"#;

    #[test]
    fn test_parse_bbox_xml_words() {
        let pages = parse_bbox_xml(BBOX_XML).unwrap();
        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert_eq!(page.page_width, 3370.0);
        assert_eq!(page.page_height, 2384.0);
        assert_eq!(page.words.len(), 4);
        assert_eq!(page.words[0].text, "NEW");
        assert_eq!(page.words[0].x, 100.0);
        assert_eq!(page.words[0].width, 25.0);
        assert_eq!(page.words[2].y, 200.5);
    }

    #[test]
    fn test_parse_bbox_xml_unescapes_text() {
        let pages = parse_bbox_xml(BBOX_XML).unwrap();
        assert_eq!(pages[0].words[3].text, "R&D");
    }

    #[test]
    fn test_parse_bbox_xml_empty_page() {
        let xml = r#"<doc><page width="595.0" height="842.0"></page></doc>"#;
        let pages = parse_bbox_xml(xml).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].words.is_empty());
    }

    #[test]
    fn test_parse_bbox_xml_no_pages() {
        let pages = parse_bbox_xml("<doc></doc>").unwrap();
        assert!(pages.is_empty());
    }
}
