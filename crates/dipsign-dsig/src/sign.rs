#![forbid(unsafe_code)]

//! XML-DSig signature creation.
//!
//! Signs a template document whose `<DigestValue>` and `<SignatureValue>`
//! elements are empty. Values are spliced into the template text at the
//! element positions reported by the parser, so everything else in the
//! template stays byte-for-byte unchanged.

use base64::Engine;
use dipsign_core::{ns, Error};
use dipsign_xml::document::{
    build_id_map, find_child_elements, find_element, parsing_options, require_child_element,
};
use dipsign_xml::XmlDocument;

use crate::context::SigningContext;
use crate::reference;
use crate::template::EnvelopingTemplate;

/// Sign an XML template document.
///
/// Returns the signed document text.
pub fn sign(ctx: &SigningContext, template_xml: &str) -> Result<String, Error> {
    let engine = base64::engine::general_purpose::STANDARD;

    // Digest each Reference, then splice the values in from last to first
    // so earlier byte ranges stay valid.
    let with_digests = {
        let doc = parse(template_xml)?;
        let id_map = build_id_map(&doc);
        let sig_node = find_element(&doc, ns::DSIG, ns::node::SIGNATURE)
            .ok_or_else(|| Error::MissingElement(ns::node::SIGNATURE.into()))?;
        let signed_info = require_child_element(sig_node, ns::DSIG, ns::node::SIGNED_INFO)?;
        reference::read_methods(signed_info)?;

        let references = find_child_elements(signed_info, ns::DSIG, ns::node::REFERENCE);
        if references.is_empty() {
            return Err(Error::MissingElement(ns::node::REFERENCE.into()));
        }
        let mut fills = Vec::with_capacity(references.len());
        for reference in references {
            let computed = reference::digest_reference(&doc, &id_map, reference)?;
            let value_node = require_child_element(reference, ns::DSIG, ns::node::DIGEST_VALUE)?;
            fills.push((value_node, engine.encode(computed)));
        }

        let mut xml = template_xml.to_owned();
        for (node, value) in fills.iter().rev() {
            xml = fill_element(&xml, *node, value)?;
        }
        xml
    };

    let doc = parse(&with_digests)?;
    let sig_node = find_element(&doc, ns::DSIG, ns::node::SIGNATURE)
        .ok_or_else(|| Error::MissingElement(ns::node::SIGNATURE.into()))?;
    let signed_info = require_child_element(sig_node, ns::DSIG, ns::node::SIGNED_INFO)?;
    let methods = reference::read_methods(signed_info)?;
    let c14n_signed_info = reference::canonicalize_signed_info(&doc, signed_info, methods.c14n)?;

    let sig_alg = dipsign_crypto::sign::from_uri(methods.signature)?;
    let signature_bytes = sig_alg.sign(&ctx.signing_key(), &c14n_signed_info)?;
    tracing::debug!(algorithm = sig_alg.uri(), len = signature_bytes.len(), "computed signature value");

    let sig_value = require_child_element(sig_node, ns::DSIG, ns::node::SIGNATURE_VALUE)?;
    fill_element(&with_digests, sig_value, &engine.encode(signature_bytes))
}

/// Wrap `payload_xml`'s document element in an enveloping signature.
///
/// The payload must be a well-formed UTF-8 document without a DTD. Its
/// document element is copied into `<ds:Object Id="object">` exactly as
/// written.
pub fn sign_enveloping(ctx: &SigningContext, payload_xml: &str) -> Result<String, Error> {
    sign_document(ctx, &XmlDocument::parse(payload_xml.to_owned())?)
}

/// Like [`sign_enveloping`], for a payload that is already parsed.
pub fn sign_document(ctx: &SigningContext, payload: &XmlDocument) -> Result<String, Error> {
    let template = EnvelopingTemplate::new(payload.document_element_source(), &ctx.certificate)
        .render()?;
    tracing::debug!(len = template.len(), "rendered signature template");
    sign(ctx, &template)
}

fn parse(xml: &str) -> Result<roxmltree::Document<'_>, Error> {
    roxmltree::Document::parse_with_options(xml, parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))
}

/// Replace the (empty) content of `node` in `xml` with `value`.
///
/// `value` must not need escaping; base64 never does.
fn fill_element(xml: &str, node: roxmltree::Node<'_, '_>, value: &str) -> Result<String, Error> {
    let name = node.tag_name().name();
    if node.children().any(|c| !c.is_text() || c.text().is_some_and(|t| !t.trim().is_empty())) {
        return Err(Error::XmlStructure(format!("{name} must be empty in a template")));
    }

    let range = node.range();
    let src = &xml[range.clone()];
    let replacement = if let Some(open) = src.strip_suffix("/>") {
        let open = open.trim_end();
        let qname_end = open
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(open.len());
        format!("{open}>{value}</{}>", &open[1..qname_end])
    } else {
        let end_tag = src
            .rfind("</")
            .ok_or_else(|| Error::XmlStructure(format!("{name} has no end tag")))?;
        let start_tag = src[..end_tag].trim_end();
        format!("{start_tag}{value}{}", &src[end_tag..])
    };

    let mut out = String::with_capacity(xml.len() + value.len());
    out.push_str(&xml[..range.start]);
    out.push_str(&replacement);
    out.push_str(&xml[range.end..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dipsign_core::algorithm;
    use dipsign_keys::loader;
    use dipsign_xml::document::{compact_text, find_child_element};
    use std::path::Path;

    fn context(key: &str, cert: &str) -> Option<SigningContext> {
        let key_path = Path::new("../../test-data/keys").join(key);
        let cert_path = Path::new("../../test-data/keys").join(cert);
        if !key_path.exists() || !cert_path.exists() {
            eprintln!("skipping test: fixtures under ../../test-data/keys not found");
            return None;
        }
        let key = loader::load_private_key_file(&key_path).unwrap();
        let cert = loader::load_certificate_file(&cert_path).unwrap();
        Some(SigningContext::new(key, cert).unwrap())
    }

    fn digest_value(xml: &str) -> String {
        let doc = roxmltree::Document::parse(xml).unwrap();
        compact_text(find_element(&doc, ns::DSIG, ns::node::DIGEST_VALUE).unwrap())
    }

    #[test]
    fn test_known_digest_value() {
        let Some(ctx) = context("rsa-2048-key.pem", "rsa-2048-cert.pem") else { return };
        let signed = sign_enveloping(&ctx, "<Report><Value>42</Value></Report>").unwrap();
        assert_eq!(
            digest_value(&signed),
            "HGb1CCq6aoyMT7/CCME/Qc3sWNtuRdxSmdpD1qAWPUo="
        );
    }

    #[test]
    fn test_signed_document_structure() {
        let Some(ctx) = context("rsa-2048-key.pem", "rsa-2048-cert.pem") else { return };
        let signed = sign_enveloping(&ctx, "<Report><Value>42</Value></Report>").unwrap();
        let doc = roxmltree::Document::parse(&signed).unwrap();

        let sigs: Vec<_> = doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == ns::node::SIGNATURE)
            .collect();
        assert_eq!(sigs.len(), 1);
        assert_eq!(doc.root_element(), sigs[0]);

        let signed_info = find_child_element(sigs[0], ns::DSIG, ns::node::SIGNED_INFO).unwrap();
        let c14n = find_child_element(signed_info, ns::DSIG, ns::node::CANONICALIZATION_METHOD).unwrap();
        assert_eq!(c14n.attribute("Algorithm"), Some(algorithm::C14N));
        let method = find_child_element(signed_info, ns::DSIG, ns::node::SIGNATURE_METHOD).unwrap();
        assert_eq!(method.attribute("Algorithm"), Some(algorithm::RSA_PSS_SHA256));
        let digest = find_element(&doc, ns::DSIG, ns::node::DIGEST_METHOD).unwrap();
        assert_eq!(digest.attribute("Algorithm"), Some(algorithm::SHA256));

        let sig_value = find_child_element(sigs[0], ns::DSIG, ns::node::SIGNATURE_VALUE).unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(compact_text(sig_value))
            .unwrap();
        assert_eq!(bytes.len(), 256);

        let object = find_child_element(sigs[0], ns::DSIG, ns::node::OBJECT).unwrap();
        assert_eq!(object.attribute("Id"), Some("object"));
        assert_eq!(object.first_child().unwrap().tag_name().name(), "Report");
    }

    #[test]
    fn test_payload_embedded_verbatim() {
        let Some(ctx) = context("rsa-2048-key.pem", "rsa-2048-cert.pem") else { return };
        let path = Path::new("../../test-data/xml/dip-unsigned.xml");
        if !path.exists() {
            eprintln!("skipping test: {path:?} not found");
            return;
        }
        let payload = XmlDocument::from_file(path).unwrap();
        let signed = sign_enveloping(&ctx, payload.text()).unwrap();
        assert!(signed.contains(payload.document_element_source()));
        assert_eq!(signed.matches(payload.document_element_source()).count(), 1);
    }

    #[test]
    fn test_digest_is_stable_signature_is_not() {
        let Some(ctx) = context("rsa-2048-key.pem", "rsa-2048-cert.pem") else { return };
        let a = sign_enveloping(&ctx, "<Report><Value>42</Value></Report>").unwrap();
        let b = sign_enveloping(&ctx, "<Report><Value>42</Value></Report>").unwrap();
        assert_eq!(digest_value(&a), digest_value(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_payload() {
        let Some(ctx) = context("rsa-2048-key.pem", "rsa-2048-cert.pem") else { return };
        let err = sign_enveloping(&ctx, "<Report><Value>42</Report>").unwrap_err();
        assert!(matches!(err, Error::XmlParse(_)));
    }

    #[test]
    fn test_entity_declarations_rejected() {
        let Some(ctx) = context("rsa-2048-key.pem", "rsa-2048-cert.pem") else { return };
        let xml = r#"<!DOCTYPE r [<!ENTITY e "x">]><r>&e;</r>"#;
        assert!(matches!(sign_enveloping(&ctx, xml), Err(Error::XmlStructure(_))));
    }

    #[test]
    fn test_doctype_is_not_digested() {
        let Some(ctx) = context("rsa-2048-key.pem", "rsa-2048-cert.pem") else { return };
        let xml = "<!DOCTYPE Report>\n<Report><Value>42</Value></Report>";
        let signed = sign_enveloping(&ctx, xml).unwrap();
        assert!(!signed.contains("DOCTYPE"));
        assert_eq!(
            digest_value(&signed),
            "HGb1CCq6aoyMT7/CCME/Qc3sWNtuRdxSmdpD1qAWPUo="
        );
    }

    #[test]
    fn test_payload_id_does_not_shadow_object() {
        let Some(ctx) = context("rsa-2048-key.pem", "rsa-2048-cert.pem") else { return };
        let signed = sign_enveloping(&ctx, r#"<Report><Item Id="object">x</Item></Report>"#).unwrap();
        assert_eq!(
            digest_value(&signed),
            "T0VnwnNjkkWD6emIAGPD41VGz3QMr9IkhtW/dRF2r44="
        );
    }

    #[test]
    fn test_latin1_payload_digest() {
        let Some(ctx) = context("rsa-2048-key.pem", "rsa-2048-cert.pem") else { return };
        let data = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><Report>\xe4</Report>";
        let payload = XmlDocument::parse_bytes(data).unwrap();
        let signed = sign_document(&ctx, &payload).unwrap();
        assert!(signed.contains("<Report>\u{e4}</Report>"));
        assert_eq!(
            digest_value(&signed),
            "8UvWw/F0wd2NNmnUsU/iU+nAEdxyFK2Fd4iwi/rkexk="
        );
    }

    #[test]
    fn test_known_digest_vectors() {
        let Some(ctx) = context("rsa-2048-key.pem", "rsa-2048-cert.pem") else { return };
        let cases = [
            (
                "<Report xmlns=\"urn:dac7\"><Value>42</Value></Report>",
                "IzVxhaUu+bfJgeRUGnp3p/lyWjjhtgdsHKYa02qx04A=",
            ),
            (
                "<Report b='&#9;t' a='x&amp;&quot;y'>1 &lt; 2 &amp; 3 > 0 \"q\" <![CDATA[<x>]]></Report>",
                "Q94EK6kFn5sWF1EViREUWUO5cwxUFKT79+Nw6LYLk/k=",
            ),
        ];
        for (payload, expected) in cases {
            let signed = sign_enveloping(&ctx, payload).unwrap();
            assert_eq!(digest_value(&signed), expected, "payload: {payload}");
        }
    }

    #[test]
    fn test_dip_report_digest() {
        let Some(ctx) = context("rsa-2048-key.pem", "rsa-2048-cert.pem") else { return };
        let path = Path::new("../../test-data/xml/dip-unsigned.xml");
        if !path.exists() {
            eprintln!("skipping test: {path:?} not found");
            return;
        }
        let payload = XmlDocument::from_file(path).unwrap();
        let signed = sign_document(&ctx, &payload).unwrap();
        assert_eq!(
            digest_value(&signed),
            "0TvosOMOdKgEfcPIBBFHAj0TbVTsQUovBp1aX7PBQBg="
        );
    }

    #[test]
    fn test_mismatched_certificate_still_signs() {
        let Some(ctx) = context("other-rsa-key.pem", "rsa-2048-cert.pem") else { return };
        let signed = sign_enveloping(&ctx, "<a/>").unwrap();
        assert!(signed.contains("<ds:SignatureValue>"));
    }

    #[test]
    fn test_fill_self_closing_element() {
        let xml = r#"<r><ds:DigestValue xmlns:ds="urn:x"/></r>"#;
        let doc = roxmltree::Document::parse(xml).unwrap();
        let node = doc.descendants().find(|n| n.has_tag_name("DigestValue")).unwrap();
        let filled = fill_element(xml, node, "AAAA").unwrap();
        assert_eq!(filled, r#"<r><ds:DigestValue xmlns:ds="urn:x">AAAA</ds:DigestValue></r>"#);
    }

    #[test]
    fn test_fill_rejects_non_empty() {
        let xml = "<r><DigestValue>abc</DigestValue></r>";
        let doc = roxmltree::Document::parse(xml).unwrap();
        let node = doc.descendants().find(|n| n.has_tag_name("DigestValue")).unwrap();
        assert!(matches!(fill_element(xml, node, "x"), Err(Error::XmlStructure(_))));
    }

    #[test]
    fn test_template_without_reference() {
        let Some(ctx) = context("rsa-2048-key.pem", "rsa-2048-cert.pem") else { return };
        let template = format!(
            r#"<ds:Signature xmlns:ds="{}"><ds:SignedInfo><ds:CanonicalizationMethod Algorithm="{}"/><ds:SignatureMethod Algorithm="{}"/></ds:SignedInfo><ds:SignatureValue></ds:SignatureValue></ds:Signature>"#,
            ns::DSIG,
            algorithm::C14N,
            algorithm::RSA_PSS_SHA256
        );
        assert!(matches!(sign(&ctx, &template), Err(Error::MissingElement(_))));
    }
}
