//! Built-in route change message.
//!
//! The client sends `CHANGE_ROUTE` with the new path as its argument when the
//! user navigates. The runtime handles it for every application: the state's
//! `on_route_change` hook runs first, then the route is replaced. The same
//! sequence applies the route a session connects from.

use liveframe_proto::Message;
use url::Url;

use crate::{handler::MessageMap, response::Response, state::State};

/// Name of the built-in route change message.
pub const CHANGE_ROUTE: &str = "CHANGE_ROUTE";

/// Handlers every session resolves before the application's own.
pub fn system_messages<S: State>() -> MessageMap<S> {
    MessageMap::new().with(CHANGE_ROUTE, handle_change_route::<S>)
}

fn handle_change_route<S: State>(message: &Message, state: &mut S) -> Response {
    match message.args.decode_string() {
        Ok(route) => {
            change_route(state, &route);
            Response::ok()
        },
        Err(err) => Response::error(err),
    }
}

/// Run the route change hook, then replace the route.
pub fn change_route<S: State>(state: &mut S, route: &str) {
    state.on_route_change(route);
    state.set_route(route);
}

fn parse(route: &str) -> Option<Url> {
    Url::parse("http://localhost/").ok()?.join(route).ok()
}

/// Path component of `route`, without query or fragment.
pub fn route_path(route: &str) -> String {
    parse(route).map_or_else(|| route.to_string(), |url| url.path().to_string())
}

/// Query parameter `name` from `route`, percent-decoded.
pub fn route_param(route: &str, name: &str) -> Option<String> {
    parse(route)?.query_pairs().find(|(key, _)| key == name).map(|(_, value)| value.into_owned())
}
