//! Counter page.

use liveframe_core::{Message, MessageMap, Response};
use liveframe_proto::js;

use super::DemoModel;
use crate::html::button;

/// Add the integer argument to the counter.
pub const INCREMENT_COUNTER: &str = "INCREMENT_COUNTER";

pub(crate) fn messages() -> MessageMap<DemoModel> {
    MessageMap::new().with(INCREMENT_COUNTER, increment)
}

fn increment(message: &Message, model: &mut DemoModel) -> Response {
    match message.args.decode_int() {
        Ok(step) => {
            model.counter = model.counter.saturating_add(step);
            Response::ok()
        },
        Err(err) => Response::error(err),
    }
}

pub(crate) fn render(counter: i64) -> String {
    format!(
        "<div id=\"counter\">{}<div class=\"counter-readout\">{counter}</div>{}</div>",
        button(&js::send_message(INCREMENT_COUNTER, &-1), "Down"),
        button(&js::send_message(INCREMENT_COUNTER, &1), "Up"),
    )
}
