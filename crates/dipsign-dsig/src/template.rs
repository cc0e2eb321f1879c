#![forbid(unsafe_code)]

//! Enveloping signature template.

use dipsign_core::{algorithm, ns, Error};
use dipsign_keys::X509Certificate;
use dipsign_xml::XmlWriter;

fn ds(local: &str) -> String {
    format!("{}:{local}", ns::DSIG_PREFIX)
}

/// A `<ds:Signature>` that wraps a payload element in `<ds:Object Id="object">`
/// and references it by `#object`.
///
/// [`render`](Self::render) leaves `DigestValue` and `SignatureValue` empty
/// for [`crate::sign::sign`] to fill.
pub struct EnvelopingTemplate<'a> {
    payload_xml: &'a str,
    certificate: &'a X509Certificate,
    c14n_method: &'static str,
    digest_method: &'static str,
    signature_method: &'static str,
}

impl<'a> EnvelopingTemplate<'a> {
    /// `payload_xml` is the source of a single element, embedded verbatim.
    pub fn new(payload_xml: &'a str, certificate: &'a X509Certificate) -> Self {
        Self {
            payload_xml,
            certificate,
            c14n_method: algorithm::C14N,
            digest_method: algorithm::SHA256,
            signature_method: algorithm::RSA_PSS_SHA256,
        }
    }

    pub fn render(&self) -> Result<String, Error> {
        let object_ref = format!("#{}", ns::OBJECT_ID);
        let mut w = XmlWriter::new();
        w.write_declaration()?;

        let xmlns = format!("xmlns:{}", ns::DSIG_PREFIX);
        w.start_element(&ds(ns::node::SIGNATURE), &[(xmlns.as_str(), ns::DSIG)])?;

        w.start_element(&ds(ns::node::SIGNED_INFO), &[])?;
        w.empty_element(
            &ds(ns::node::CANONICALIZATION_METHOD),
            &[(ns::attr::ALGORITHM, self.c14n_method)],
        )?;
        w.empty_element(
            &ds(ns::node::SIGNATURE_METHOD),
            &[(ns::attr::ALGORITHM, self.signature_method)],
        )?;
        w.start_element(&ds(ns::node::REFERENCE), &[(ns::attr::URI, object_ref.as_str())])?;
        w.empty_element(
            &ds(ns::node::DIGEST_METHOD),
            &[(ns::attr::ALGORITHM, self.digest_method)],
        )?;
        w.text_element(&ds(ns::node::DIGEST_VALUE), "")?;
        w.end_element(&ds(ns::node::REFERENCE))?;
        w.end_element(&ds(ns::node::SIGNED_INFO))?;

        w.text_element(&ds(ns::node::SIGNATURE_VALUE), "")?;

        w.start_element(&ds(ns::node::KEY_INFO), &[])?;
        w.start_element(&ds(ns::node::X509_DATA), &[])?;
        w.text_element(&ds(ns::node::X509_SUBJECT_NAME), &self.certificate.subject_name())?;
        w.text_element(&ds(ns::node::X509_CERTIFICATE), &self.certificate.to_base64())?;
        w.end_element(&ds(ns::node::X509_DATA))?;
        w.end_element(&ds(ns::node::KEY_INFO))?;

        w.start_element(&ds(ns::node::OBJECT), &[(ns::attr::ID, ns::OBJECT_ID)])?;
        w.write_raw(self.payload_xml);
        w.end_element(&ds(ns::node::OBJECT))?;

        w.end_element(&ds(ns::node::SIGNATURE))?;
        w.into_string()
    }
}
