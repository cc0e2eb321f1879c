#![forbid(unsafe_code)]

//! Character escaping for canonical output, written straight into the
//! output buffer.
//!
//! Every character that needs a reference is ASCII, so the input is scanned
//! bytewise and unescaped runs are copied whole.

fn text_ref(b: u8) -> Option<&'static [u8]> {
    match b {
        b'&' => Some(b"&amp;"),
        b'<' => Some(b"&lt;"),
        b'>' => Some(b"&gt;"),
        b'\r' => Some(b"&#xD;"),
        _ => None,
    }
}

fn attr_ref(b: u8) -> Option<&'static [u8]> {
    match b {
        b'&' => Some(b"&amp;"),
        b'<' => Some(b"&lt;"),
        b'"' => Some(b"&quot;"),
        b'\t' => Some(b"&#x9;"),
        b'\n' => Some(b"&#xA;"),
        b'\r' => Some(b"&#xD;"),
        _ => None,
    }
}

fn pi_ref(b: u8) -> Option<&'static [u8]> {
    (b == b'\r').then_some(b"&#xD;".as_slice())
}

fn write_escaped(out: &mut Vec<u8>, s: &str, reference: fn(u8) -> Option<&'static [u8]>) {
    let bytes = s.as_bytes();
    let mut run = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(r) = reference(b) {
            out.extend_from_slice(&bytes[run..i]);
            out.extend_from_slice(r);
            run = i + 1;
        }
    }
    out.extend_from_slice(&bytes[run..]);
}

/// Text node content: `&`, `<`, `>` and CR.
pub fn write_text(out: &mut Vec<u8>, s: &str) {
    write_escaped(out, s, text_ref);
}

/// Attribute and namespace values: `&`, `<`, `"`, TAB, LF and CR.
pub fn write_attr(out: &mut Vec<u8>, s: &str) {
    write_escaped(out, s, attr_ref);
}

/// Processing instruction data: CR only.
pub fn write_pi(out: &mut Vec<u8>, s: &str) {
    write_escaped(out, s, pi_ref);
}
