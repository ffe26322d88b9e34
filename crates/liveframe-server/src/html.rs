//! Minimal HTML helpers for server-rendered views.

pub use liveframe_core::view::escape_html as escape;

/// `<button>` whose click runs the client call `action`.
pub fn button(action: &str, label: &str) -> String {
    format!("<button onclick=\"{}\">{}</button>", escape(action), escape(label))
}

/// Link the client intercepts and turns into a route change.
pub fn link(href: &str, label: &str) -> String {
    format!("<a class=\"liveframe-link\" href=\"{}\">{}</a>", escape(href), escape(label))
}

#[cfg(test)]
mod tests {
    use liveframe_proto::js;

    use super::*;

    #[test]
    fn button_attribute_survives_quotes() {
        insta::assert_snapshot!(
            button(&js::send_message("INCREMENT_COUNTER", &1), "+"),
            @r#"<button onclick="liveframe.sendMessage(&quot;INCREMENT_COUNTER&quot;, &quot;1&quot;)">+</button>"#
        );
    }
}
