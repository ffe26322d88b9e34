//! HTML document shell.
//!
//! A plain page load gets the full document: the initial render inside the
//! `#view` container plus the client script, which then opens the live
//! connection and takes over the container.

use std::fmt::Write as _;

use crate::html::escape;

/// Id of the element the client replaces on every frame.
pub const VIEW_ID: &str = "view";

/// Static parts of the HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentShell {
    title: String,
    script_src: String,
}

impl DocumentShell {
    /// Shell with the given title and client script URL.
    pub fn new(title: impl Into<String>, script_src: impl Into<String>) -> Self {
        Self { title: title.into(), script_src: script_src.into() }
    }

    /// Wrap a render body in the full document.
    pub fn wrap(&self, body: &[u8]) -> String {
        let mut page = String::with_capacity(body.len() + 256);
        page.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        let _ = writeln!(page, "<title>{}</title>", escape(&self.title));
        page.push_str("</head>\n<body>\n");
        let _ = writeln!(page, "<div id=\"{VIEW_ID}\">{}</div>", String::from_utf8_lossy(body));
        let _ = writeln!(page, "<script src=\"{}\"></script>", escape(&self.script_src));
        page.push_str("</body>\n</html>\n");
        page
    }
}
