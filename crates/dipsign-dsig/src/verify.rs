#![forbid(unsafe_code)]

//! XML-DSig signature verification.
//!
//! Processing order:
//! 1. Parse `<Signature>`, register ID attributes
//! 2. Read `<SignedInfo>`: CanonicalizationMethod, SignatureMethod
//! 3. For each `<Reference>`: resolve URI, run transforms, digest, compare
//! 4. Resolve the verification key
//! 5. Canonicalize `<SignedInfo>`
//! 6. Verify `<SignatureValue>`

use base64::Engine;
use dipsign_core::{ns, Error};
use dipsign_crypto::SigningKey;
use dipsign_keys::X509Certificate;
use dipsign_xml::document::{
    build_id_map, compact_text, find_child_element, find_child_elements, find_element,
    parsing_options, require_child_element,
};

use crate::context::VerifyContext;
use crate::reference;

/// Result of signature verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    /// Signature is valid.
    Valid,
    /// Signature is invalid.
    Invalid { reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid)
    }
}

/// Verify a signed XML document.
///
/// Malformed input and unsupported algorithms are errors; digest and
/// signature mismatches are reported as [`VerifyResult::Invalid`].
pub fn verify(ctx: &VerifyContext, signed_xml: &str) -> Result<VerifyResult, Error> {
    let engine = base64::engine::general_purpose::STANDARD;
    let doc = roxmltree::Document::parse_with_options(signed_xml, parsing_options())
        .map_err(|e| Error::XmlParse(e.to_string()))?;
    let id_map = build_id_map(&doc);

    let sig_node = find_element(&doc, ns::DSIG, ns::node::SIGNATURE)
        .ok_or_else(|| Error::MissingElement(ns::node::SIGNATURE.into()))?;
    let signed_info = require_child_element(sig_node, ns::DSIG, ns::node::SIGNED_INFO)?;
    let methods = reference::read_methods(signed_info)?;

    let references = find_child_elements(signed_info, ns::DSIG, ns::node::REFERENCE);
    if references.is_empty() {
        return Err(Error::MissingElement(ns::node::REFERENCE.into()));
    }
    for reference in references {
        let uri = reference.attribute(ns::attr::URI).unwrap_or("");
        let computed = reference::digest_reference(&doc, &id_map, reference)?;
        let value_node = require_child_element(reference, ns::DSIG, ns::node::DIGEST_VALUE)?;
        let expected = engine
            .decode(compact_text(value_node))
            .map_err(|e| Error::Base64(format!("DigestValue: {e}")))?;
        if computed != expected {
            tracing::debug!(uri, "reference digest mismatch");
            return Ok(VerifyResult::Invalid {
                reason: format!("Reference digest failed for URI {uri:?}"),
            });
        }
    }

    let key = match &ctx.key {
        Some(key) => key.to_signing_key(),
        None => SigningKey::RsaPublic(embedded_certificate(sig_node)?.public_key().clone()),
    };

    let c14n_signed_info = reference::canonicalize_signed_info(&doc, signed_info, methods.c14n)?;

    let sig_value_node = require_child_element(sig_node, ns::DSIG, ns::node::SIGNATURE_VALUE)?;
    let sig_value = engine
        .decode(compact_text(sig_value_node))
        .map_err(|e| Error::Base64(format!("SignatureValue: {e}")))?;

    let sig_alg = dipsign_crypto::sign::from_uri(methods.signature)?;
    if sig_alg.verify(&key, &c14n_signed_info, &sig_value)? {
        Ok(VerifyResult::Valid)
    } else {
        Ok(VerifyResult::Invalid {
            reason: "signature value verification failed".into(),
        })
    }
}

/// The certificate carried in `KeyInfo/X509Data/X509Certificate`.
fn embedded_certificate(sig_node: roxmltree::Node<'_, '_>) -> Result<X509Certificate, Error> {
    let cert_node = find_child_element(sig_node, ns::DSIG, ns::node::KEY_INFO)
        .and_then(|ki| find_child_element(ki, ns::DSIG, ns::node::X509_DATA))
        .and_then(|xd| find_child_element(xd, ns::DSIG, ns::node::X509_CERTIFICATE))
        .ok_or_else(|| Error::Key("no verification key: KeyInfo has no X509Certificate".into()))?;
    let der = base64::engine::general_purpose::STANDARD
        .decode(compact_text(cert_node))
        .map_err(|e| Error::Base64(format!("X509Certificate: {e}")))?;
    X509Certificate::from_der(&der)
}
