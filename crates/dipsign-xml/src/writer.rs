#![forbid(unsafe_code)]

//! XML writing over quick-xml, used to emit signature templates.

use dipsign_core::Error;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

fn write_err(e: impl std::fmt::Display) -> Error {
    Error::Other(format!("XML write error: {e}"))
}

/// A small element-oriented XML writer.
///
/// Text and attribute values are escaped; [`XmlWriter::write_raw`] inserts
/// already well-formed markup unchanged.
pub struct XmlWriter {
    writer: quick_xml::Writer<Vec<u8>>,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            writer: quick_xml::Writer::new(Vec::new()),
        }
    }

    /// Write `<?xml version="1.0" encoding="UTF-8" standalone="no"?>`.
    pub fn write_declaration(&mut self) -> Result<(), Error> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))
            .map_err(write_err)
    }

    /// Start an element with the given name and attributes.
    pub fn start_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
        let mut start = BytesStart::new(name);
        start.extend_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(start)).map_err(write_err)
    }

    /// Write a self-closing element.
    pub fn empty_element(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), Error> {
        let mut start = BytesStart::new(name);
        start.extend_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(start)).map_err(write_err)
    }

    pub fn end_element(&mut self, name: &str) -> Result<(), Error> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(write_err)
    }

    /// Write escaped text content.
    pub fn write_text(&mut self, text: &str) -> Result<(), Error> {
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_err)
    }

    /// `<name>text</name>`, with an explicit end tag even when `text` is empty.
    pub fn text_element(&mut self, name: &str, text: &str) -> Result<(), Error> {
        self.start_element(name, &[])?;
        if !text.is_empty() {
            self.write_text(text)?;
        }
        self.end_element(name)
    }

    /// Append markup verbatim.
    pub fn write_raw(&mut self, markup: &str) {
        self.writer.get_mut().extend_from_slice(markup.as_bytes());
    }

    pub fn into_string(self) -> Result<String, Error> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| Error::Other(format!("XML writer produced invalid UTF-8: {e}")))
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elements_and_escaping() {
        let mut w = XmlWriter::new();
        w.start_element("ds:Root", &[("xmlns:ds", "urn:x"), ("a", "1 & \"2\"")]).unwrap();
        w.empty_element("ds:Empty", &[("Algorithm", "urn:alg")]).unwrap();
        w.text_element("ds:Value", "a<b").unwrap();
        w.text_element("ds:Blank", "").unwrap();
        w.write_raw("<Raw x='1'/>");
        w.end_element("ds:Root").unwrap();
        let out = w.into_string().unwrap();
        assert_eq!(
            out,
            "<ds:Root xmlns:ds=\"urn:x\" a=\"1 &amp; &quot;2&quot;\">\
             <ds:Empty Algorithm=\"urn:alg\"/>\
             <ds:Value>a&lt;b</ds:Value>\
             <ds:Blank></ds:Blank>\
             <Raw x='1'/>\
             </ds:Root>"
        );
    }

    #[test]
    fn test_declaration() {
        let mut w = XmlWriter::new();
        w.write_declaration().unwrap();
        assert_eq!(
            w.into_string().unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>"
        );
    }
}
