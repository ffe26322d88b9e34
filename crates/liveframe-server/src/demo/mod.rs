//! Demo application.
//!
//! One state type with a page per feature:
//!
//! | Route        | Shows                                             |
//! |--------------|---------------------------------------------------|
//! | `/`          | index                                             |
//! | `/counter`   | message with an integer argument                  |
//! | `/animation` | server-driven loop of delayed follow-ups          |
//! | `/chat`      | shared state propagated with broadcast            |
//! | `/tags`      | two instances of a namespaced component           |
//! | `/crash`     | handler panic and decode error containment        |

pub mod animation;
pub mod chat;
pub mod counter;
pub mod crash;
pub mod tags;

use liveframe_core::{
    MessageMap, RenderError, RequestContext, SessionId, SessionRegistry, State, routing,
};

use crate::html::{escape, link};

pub use animation::Animation;
pub use chat::{ChatLine, ChatLog};
pub use tags::TagSelector;

/// Data shared by every demo session.
#[derive(Debug, Clone, Default)]
pub struct DemoShared {
    /// Chat history
    pub chat: ChatLog,
}

/// Per-session demo state.
#[derive(Debug, Clone)]
pub struct DemoModel {
    route: String,
    /// Counter page value
    pub counter: i64,
    /// Bouncing ball
    pub animation: Animation,
    /// Name shown next to chat lines
    pub username: String,
    /// Tag selector instances, in display order
    pub selectors: Vec<TagSelector>,
    chat: ChatLog,
    session: SessionId,
    registry: SessionRegistry,
}

impl DemoModel {
    /// Chat history shared with every other session.
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// Queue a re-render on every other live session. This session renders
    /// anyway once the handler commits.
    pub(crate) fn broadcast(&self) -> usize {
        self.registry.broadcast_except(self.session)
    }
}

impl State for DemoModel {
    type Shared = DemoShared;

    fn init(request: &RequestContext, shared: &DemoShared) -> Self {
        let username = request.query("user").map_or_else(
            || format!("guest-{:04x}", request.session_id().as_u64() & 0xffff),
            str::to_string,
        );

        Self {
            route: "/".to_string(),
            counter: 0,
            animation: Animation::default(),
            username,
            selectors: tags::demo_selectors(),
            chat: shared.chat.clone(),
            session: request.session_id(),
            registry: request.registry().clone(),
        }
    }

    fn update(&self) -> MessageMap<Self> {
        MessageMap::merge_all([
            counter::messages(),
            animation::messages(),
            chat::messages(),
            crash::messages(),
            tags::messages(&self.selectors),
        ])
    }

    fn render(&self) -> Result<Vec<u8>, RenderError> {
        let path = routing::route_path(&self.route);
        let page = match path.as_str() {
            "/" => index(),
            "/counter" => counter::render(self.counter),
            "/animation" => animation::render(&self.animation),
            "/chat" => chat::render(&self.username, &self.chat.lines()),
            "/tags" => tags::render(&self.selectors),
            "/crash" => crash::render(),
            other => format!("<h2>Not found</h2><p>No page at {}</p>", escape(other)),
        };

        Ok(format!("{}<main>{page}</main>", nav()).into_bytes())
    }

    fn route(&self) -> &str {
        &self.route
    }

    fn set_route(&mut self, route: &str) {
        self.route = route.to_string();
    }

    fn on_route_change(&mut self, new_route: &str) {
        if routing::route_path(new_route) != "/animation" {
            self.animation.halt();
        }
    }
}

const PAGES: [(&str, &str); 6] = [
    ("/", "Home"),
    ("/counter", "Counter"),
    ("/animation", "Animation"),
    ("/chat", "Chat"),
    ("/tags", "Tags"),
    ("/crash", "Crash"),
];

fn nav() -> String {
    let links: Vec<String> = PAGES.iter().map(|(href, label)| link(href, label)).collect();
    format!("<nav>{}</nav>", links.join(" | "))
}

fn index() -> String {
    "<h1>liveframe</h1><p>All state on this page lives on the server. Every click sends a \
     message over the socket and the server answers with a fresh render.</p>"
        .to_string()
}
