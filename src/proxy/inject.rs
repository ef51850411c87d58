//! Script injection into proxied HTML documents.
//!
//! The splice is textual: the document is never parsed or re-serialized, so
//! every byte outside the insertion point is preserved. Callers must not run
//! the injector twice over the same document; a second pass adds a second tag.

const BODY_CLOSE: &[u8] = b"</body>";

/// Inserts a fixed script element before the closing body tag.
#[derive(Debug, Clone)]
pub struct HtmlInjector {
    script_tag: String,
}

impl HtmlInjector {
    /// Create an injector for a complete `<script ...></script>` element.
    pub fn new(script_tag: impl Into<String>) -> Self {
        Self {
            script_tag: script_tag.into(),
        }
    }

    /// Splice the script tag before the first `</body>`, or append it when the
    /// document has none (fragments, truncated pages).
    ///
    /// Operates on raw bytes so documents in any ASCII-compatible charset
    /// survive untouched.
    pub fn inject(&self, document: &[u8]) -> Vec<u8> {
        let tag = self.script_tag.as_bytes();
        let mut out = Vec::with_capacity(document.len() + tag.len());

        match find(document, BODY_CLOSE) {
            Some(at) => {
                out.extend_from_slice(&document[..at]);
                out.extend_from_slice(tag);
                out.extend_from_slice(&document[at..]);
            }
            None => {
                out.extend_from_slice(document);
                out.extend_from_slice(tag);
            }
        }
        out
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
