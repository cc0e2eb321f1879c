#![forbid(unsafe_code)]

//! XML document wrapper over roxmltree, plus lookup helpers shared by the
//! signer and the verifier.

use dipsign_core::Error;
use std::collections::HashMap;
use std::ops::Range;

/// Attribute names treated as XML IDs when resolving `#fragment` URIs.
pub const ID_ATTRS: [&str; 3] = ["Id", "ID", "id"];

/// An owned, well-formed XML document.
#[derive(Debug)]
pub struct XmlDocument {
    text: String,
    root_range: Range<usize>,
}

impl XmlDocument {
    /// Parse and validate XML from a string, taking ownership.
    ///
    /// A DOCTYPE is accepted, but an internal subset that declares entities
    /// or attribute defaults is not: the document element is embedded into
    /// the signature verbatim and those declarations would not travel with it.
    pub fn parse(text: String) -> Result<Self, Error> {
        let root_range = {
            let doc = roxmltree::Document::parse_with_options(&text, parsing_options())
                .map_err(|e| Error::XmlParse(e.to_string()))?;
            doc.root_element().range()
        };
        let prolog = &text[..root_range.start];
        if let Some(decl) = ["<!ENTITY", "<!ATTLIST"].into_iter().find(|d| prolog.contains(d)) {
            return Err(Error::XmlStructure(format!(
                "internal DTD subset with {decl} declarations is not supported"
            )));
        }
        Ok(Self { text, root_range })
    }

    /// Parse XML from bytes in the encoding given by a byte order mark or
    /// the XML declaration, UTF-8 when neither is present.
    pub fn parse_bytes(data: &[u8]) -> Result<Self, Error> {
        Self::parse(decode_text(data)?)
    }

    /// Read and parse an XML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, Error> {
        let data = std::fs::read(path)
            .map_err(|e| Error::Other(format!("{}: {e}", path.display())))?;
        Self::parse_bytes(&data)
    }

    /// Get the raw XML text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The source text of the document element, from its start tag to its
    /// end tag, exactly as it appeared in the input.
    pub fn document_element_source(&self) -> &str {
        &self.text[self.root_range.clone()]
    }
}

/// roxmltree options for every document dipsign parses: DTDs are allowed.
pub fn parsing_options() -> roxmltree::ParsingOptions {
    roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    }
}

fn decode_text(data: &[u8]) -> Result<String, Error> {
    let (encoding, body) = match encoding_rs::Encoding::for_bom(data) {
        Some((encoding, bom_len)) => (encoding, &data[bom_len..]),
        None => (declared_encoding(data)?.unwrap_or(encoding_rs::UTF_8), data),
    };
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| Error::XmlParse(format!("input is not valid {}", encoding.name())))
}

/// The encoding named by the `encoding` pseudo-attribute of the XML declaration.
fn declared_encoding(data: &[u8]) -> Result<Option<&'static encoding_rs::Encoding>, Error> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_reader(data);
    let mut buf = Vec::new();
    let Ok(Event::Decl(decl)) = reader.read_event_into(&mut buf) else {
        return Ok(None);
    };
    let Some(label) = decl.encoding() else {
        return Ok(None);
    };
    let label = label.map_err(|e| Error::XmlParse(format!("bad XML declaration: {e}")))?;
    encoding_rs::Encoding::for_label(&label)
        .map(Some)
        .ok_or_else(|| {
            Error::XmlParse(format!(
                "unsupported encoding: {}",
                String::from_utf8_lossy(&label)
            ))
        })
}

/// Build the ID → NodeId mapping for a parsed document.
///
/// The first element carrying an ID wins. An enveloped payload can reuse
/// the ID of its `<ds:Object>` wrapper, which always precedes it.
pub fn build_id_map(doc: &roxmltree::Document<'_>) -> HashMap<String, roxmltree::NodeId> {
    let mut map = HashMap::new();
    for node in doc.descendants().filter(|n| n.is_element()) {
        for attr_name in ID_ATTRS {
            if let Some(val) = node.attribute(attr_name) {
                map.entry(val.to_owned()).or_insert(node.id());
            }
        }
    }
    map
}

/// Resolve a same-document reference (`#foo`) to the element carrying that ID.
pub fn resolve_fragment<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    id_map: &HashMap<String, roxmltree::NodeId>,
    uri: &str,
) -> Result<roxmltree::Node<'a, 'input>, Error> {
    let id = uri
        .strip_prefix('#')
        .ok_or_else(|| Error::InvalidUri(format!("not a same-document reference: {uri}")))?;
    id_map
        .get(id)
        .and_then(|nid| doc.get_node(*nid))
        .ok_or_else(|| Error::InvalidUri(format!("ID not found: {id}")))
}

fn is_named(node: &roxmltree::Node<'_, '_>, ns_uri: &str, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace().unwrap_or("") == ns_uri
}

/// Find the first descendant element with the given namespace and local name.
pub fn find_element<'a, 'input>(
    doc: &'a roxmltree::Document<'input>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    doc.descendants().find(|n| is_named(n, ns_uri, local_name))
}

pub fn find_child_element<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    parent.children().find(|n| is_named(n, ns_uri, local_name))
}

pub fn find_child_elements<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    parent
        .children()
        .filter(|n| is_named(n, ns_uri, local_name))
        .collect()
}

/// Like [`find_child_element`], but a missing element is an error.
pub fn require_child_element<'a, 'input>(
    parent: roxmltree::Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Result<roxmltree::Node<'a, 'input>, Error> {
    find_child_element(parent, ns_uri, local_name)
        .ok_or_else(|| Error::MissingElement(local_name.to_owned()))
}

/// Read the `Algorithm` attribute of a method element such as `DigestMethod`.
pub fn algorithm_attr<'a>(node: roxmltree::Node<'a, '_>) -> Result<&'a str, Error> {
    node.attribute("Algorithm").ok_or_else(|| {
        Error::MissingAttribute(format!("Algorithm on {}", node.tag_name().name()))
    })
}

/// Text content of an element with all whitespace removed (for base64 values).
pub fn compact_text(node: roxmltree::Node<'_, '_>) -> String {
    node.text()
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DSIG: &str = "http://www.w3.org/2000/09/xmldsig#";

    #[test]
    fn test_document_element_source_is_verbatim() {
        let xml = "<?xml version=\"1.0\"?>\n<!-- head -->\n<Report a='1'><Value>42</Value></Report>\n";
        let doc = XmlDocument::parse(xml.to_owned()).unwrap();
        assert_eq!(
            doc.document_element_source(),
            "<Report a='1'><Value>42</Value></Report>"
        );
    }

    #[test]
    fn test_malformed_is_parse_error() {
        let err = XmlDocument::parse("<Report><Value>42</Report>".into()).unwrap_err();
        assert!(matches!(err, Error::XmlParse(_)));
    }

    #[test]
    fn test_doctype_without_subset_is_accepted() {
        let xml = "<!DOCTYPE Report>\n<Report><Value>42</Value></Report>";
        let doc = XmlDocument::parse(xml.into()).unwrap();
        assert_eq!(doc.document_element_source(), "<Report><Value>42</Value></Report>");
    }

    #[test]
    fn test_entity_declarations_are_rejected() {
        let xml = "<!DOCTYPE r [<!ENTITY e \"x\">]><r>&e;</r>";
        let err = XmlDocument::parse(xml.into()).unwrap_err();
        assert!(matches!(err, Error::XmlStructure(_)));

        let xml = "<!DOCTYPE r [<!ATTLIST r a CDATA \"1\">]><r/>";
        assert!(matches!(XmlDocument::parse(xml.into()), Err(Error::XmlStructure(_))));
    }

    #[test]
    fn test_declared_latin1_is_decoded() {
        let data = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><Report>\xe4</Report>";
        let doc = XmlDocument::parse_bytes(data).unwrap();
        assert_eq!(doc.document_element_source(), "<Report>\u{e4}</Report>");
    }

    #[test]
    fn test_utf16_bom_is_decoded() {
        let mut data = vec![0xFF, 0xFE];
        for unit in "<r>\u{e4}</r>".encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        let doc = XmlDocument::parse_bytes(&data).unwrap();
        assert_eq!(doc.document_element_source(), "<r>\u{e4}</r>");
    }

    #[test]
    fn test_unknown_encoding_label() {
        let data = b"<?xml version=\"1.0\" encoding=\"X-NOPE\"?><r/>";
        assert!(matches!(XmlDocument::parse_bytes(data), Err(Error::XmlParse(_))));
    }

    #[test]
    fn test_first_id_wins() {
        let xml = r#"<w Id="object"><r><i Id="object"/></r></w>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let ids = build_id_map(&doc);
        let found = resolve_fragment(&doc, &ids, "#object").unwrap();
        assert_eq!(found, doc.root_element());
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let err = XmlDocument::parse_bytes(b"<r>\xff</r>").unwrap_err();
        assert!(matches!(err, Error::XmlParse(_)));
    }

    #[test]
    fn test_lookup_helpers() {
        let xml = format!(
            r#"<ds:Signature xmlns:ds="{DSIG}"><ds:SignedInfo><ds:Reference URI="a"/><ds:Reference URI="b"/></ds:SignedInfo><ds:Object Id="object"><x/></ds:Object></ds:Signature>"#
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let sig = find_element(&doc, DSIG, "Signature").unwrap();
        let si = require_child_element(sig, DSIG, "SignedInfo").unwrap();
        assert_eq!(find_child_elements(si, DSIG, "Reference").len(), 2);
        assert!(find_child_element(sig, DSIG, "KeyInfo").is_none());
        assert!(matches!(
            require_child_element(sig, DSIG, "KeyInfo"),
            Err(Error::MissingElement(_))
        ));

        let ids = build_id_map(&doc);
        let obj = resolve_fragment(&doc, &ids, "#object").unwrap();
        assert_eq!(obj.tag_name().name(), "Object");
        assert!(matches!(
            resolve_fragment(&doc, &ids, "#missing"),
            Err(Error::InvalidUri(_))
        ));
    }
}
