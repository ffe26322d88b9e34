//! Chat room.
//!
//! The log lives in [`DemoShared`](super::DemoShared) and is visible to every
//! session. Posting appends under the log's own lock and then broadcasts to
//! the other sessions, so every open tab re-renders with the new line. The
//! posting tab gets its single frame from its own commit.

use std::sync::{Arc, Mutex, PoisonError};

use liveframe_core::{HandlerError, Message, MessageMap, Response};
use liveframe_proto::js;

use super::DemoModel;
use crate::html::{button, escape};

/// Post the string argument to the room.
pub const SEND_MESSAGE: &str = "SEND_MESSAGE";

/// Oldest lines are dropped beyond this.
pub const MAX_LINES: usize = 200;

const INPUT_ID: &str = "message-input";

/// One posted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    /// Poster
    pub user: String,
    /// Message text
    pub text: String,
}

/// Shared chat history.
#[derive(Debug, Clone, Default)]
pub struct ChatLog(Arc<Mutex<Vec<ChatLine>>>);

impl ChatLog {
    /// Append a line, dropping the oldest past [`MAX_LINES`].
    pub fn push(&self, line: ChatLine) {
        let mut lines = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        lines.push(line);
        if lines.len() > MAX_LINES {
            let excess = lines.len() - MAX_LINES;
            lines.drain(..excess);
        }
    }

    /// Copy of the history, oldest first.
    pub fn lines(&self) -> Vec<ChatLine> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

pub(crate) fn messages() -> MessageMap<DemoModel> {
    MessageMap::new().with(SEND_MESSAGE, send)
}

fn send(message: &Message, model: &mut DemoModel) -> Response {
    let text = match message.args.decode_string() {
        Ok(text) => text,
        Err(err) => return Response::error(err),
    };

    let text = text.trim();
    if text.is_empty() {
        return Response::error(HandlerError::msg("cannot post an empty message"));
    }

    model.chat().push(ChatLine { user: model.username.clone(), text: text.to_string() });
    let reached = model.broadcast();
    tracing::debug!(user = %model.username, sessions = reached, "chat line posted");
    Response::ok()
}

pub(crate) fn render(username: &str, lines: &[ChatLine]) -> String {
    let mut out = String::from("<h2>Chat room</h2><div id=\"messages\">");
    for line in lines {
        let class = if line.user == username { "message-left" } else { "message-right" };
        out.push_str(&format!(
            "<div class=\"{class}\"><span class=\"message-username\">{}</span>\
             <p class=\"message-text\">{}</p></div>",
            escape(&line.user),
            escape(&line.text),
        ));
    }
    out.push_str("</div>");
    out.push_str(&format!(
        "<p class=\"username-display\">Posting as {}</p>\
         <input type=\"text\" id=\"{INPUT_ID}\" placeholder=\"Your message\">{}",
        escape(username),
        button(&js::send_message_with_value(SEND_MESSAGE, INPUT_ID), "Send"),
    ));
    out
}

#[cfg(test)]
mod tests {
    use liveframe_core::ConnectRequest;
    use liveframe_harness::TestSession;
    use serde_json::json;

    use super::*;
    use crate::demo::DemoShared;

    #[test]
    fn sessions_share_the_log() {
        let shared = DemoShared::default();
        let request = ConnectRequest::new("/chat").with_query("user", "ada");
        let mut ada: TestSession<DemoModel> = TestSession::init(&request, &shared);
        let bob: TestSession<DemoModel> = TestSession::init(&ConnectRequest::new("/chat"), &shared);

        ada.dispatch(SEND_MESSAGE, json!("hello <b>bob</b>")).expect("post");
        let page = bob.render_string();
        assert!(page.contains("hello &lt;b&gt;bob&lt;/b&gt;"));
        assert!(page.contains(">ada<"));
    }

    #[test]
    fn blank_message_is_rejected() {
        let shared = DemoShared::default();
        let mut session: TestSession<DemoModel> =
            TestSession::init(&ConnectRequest::new("/chat"), &shared);

        assert!(session.dispatch(SEND_MESSAGE, json!("   ")).is_err());
        assert!(shared.chat.lines().is_empty());
    }

    #[test]
    fn log_is_bounded() {
        let log = ChatLog::default();
        for n in 0..MAX_LINES + 5 {
            log.push(ChatLine { user: "u".into(), text: n.to_string() });
        }
        let lines = log.lines();
        assert_eq!(lines.len(), MAX_LINES);
        assert_eq!(lines[0].text, "5");
    }
}
