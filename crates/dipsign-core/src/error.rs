#![forbid(unsafe_code)]

/// Errors produced while loading inputs, building or checking a signature.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("invalid XML structure: {0}")]
    XmlStructure(String),

    #[error("invalid PEM data: {0}")]
    Pem(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("certificate error: {0}")]
    Certificate(String),

    #[error("missing required element: {0}")]
    MissingElement(String),

    #[error("missing required attribute: {0}")]
    MissingAttribute(String),

    #[error("invalid URI reference: {0}")]
    InvalidUri(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_detail() {
        let e = Error::Key("not an RSA key".into());
        assert_eq!(e.to_string(), "key error: not an RSA key");
    }

    #[test]
    fn test_io_error_converts() {
        fn open() -> Result<Vec<u8>> {
            Ok(std::fs::read("/nonexistent/dipsign/key.pem")?)
        }
        assert!(matches!(open(), Err(Error::Io(_))));
    }
}
