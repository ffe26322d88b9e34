//! Fallback error view.

use bytes::Bytes;

/// HTML shown in place of the application's view after a failure.
pub fn error_page(message: &str) -> Bytes {
    Bytes::from(format!(
        "<div id=\"liveframe-error\"><h1>Whoops!</h1><h2>There was a runtime error</h2><hr /><p>{}</p></div>",
        escape_html(message)
    ))
}

/// Escape text for element content and double-quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn error_page_escapes_message() {
        let page = error_page("could not process message <X>: \"boom\"");
        insta::assert_snapshot!(
            String::from_utf8_lossy(&page),
            @r#"<div id="liveframe-error"><h1>Whoops!</h1><h2>There was a runtime error</h2><hr /><p>could not process message &lt;X&gt;: &quot;boom&quot;</p></div>"#
        );
    }
}
