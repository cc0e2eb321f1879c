#![forbid(unsafe_code)]

pub use dipsign_c14n as c14n;
pub use dipsign_core as core;
pub use dipsign_crypto as crypto;
pub use dipsign_dsig as dsig;
pub use dipsign_keys as keys;
pub use dipsign_xml as xml;

use base64::Engine;
use dipsign_core::Error;
use dipsign_dsig::SigningContext;
use dipsign_keys::loader;
use dipsign_xml::XmlDocument;
use std::path::Path;

/// Sign the document at `xml_path` and return the signed XML, base64-encoded
/// on a single line.
pub fn run(key_path: &Path, cert_path: &Path, xml_path: &Path) -> Result<String, Error> {
    let key = loader::load_private_key_file(key_path)?;
    let certificate = loader::load_certificate_file(cert_path)?;
    tracing::info!(subject = %certificate.subject_name(), "loaded signer certificate");
    let ctx = SigningContext::new(key, certificate)?;

    let payload = XmlDocument::from_file(xml_path)?;
    let signed = dipsign_dsig::sign::sign_document(&ctx, &payload)?;
    tracing::info!(len = signed.len(), "signed {}", xml_path.display());

    Ok(base64::engine::general_purpose::STANDARD.encode(signed.as_bytes()))
}
