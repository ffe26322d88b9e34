//! Crash containment page.

use liveframe_core::{Message, MessageMap, Response};
use liveframe_proto::js;

use super::{DemoModel, counter::INCREMENT_COUNTER};
use crate::html::button;

/// Panic inside the handler.
pub const CRASH_ME: &str = "CRASH_ME";

pub(crate) fn messages() -> MessageMap<DemoModel> {
    MessageMap::new().with(CRASH_ME, crash)
}

#[allow(clippy::panic)]
fn crash(_: &Message, _: &mut DemoModel) -> Response {
    panic!("I told you not to hit the big red button")
}

pub(crate) fn render() -> String {
    format!(
        "<div id=\"crash\"><p>A panicking handler or a bad argument only replaces this tab's \
         view with an error. Other tabs and the server keep running.</p>{}{}</div>",
        button(&js::send_message_no_args(CRASH_ME), "Crash!"),
        button(&js::send_message(INCREMENT_COUNTER, "not a number"), "Send a bad argument"),
    )
}
