//! Reusable application model for runtime tests.
//!
//! [`TestModel`] covers every runtime feature in one state type: a counter, a
//! zero-delay follow-up, a self-scheduling tick loop with a stop flag, a
//! handler that panics, a render that can be broken on demand, a shared chat
//! log with broadcast, two namespaced toggle components and route tracking.
//!
//! It renders as plain `key=value` lines so assertions can use `contains`.

use std::{
    collections::BTreeMap,
    fmt::Write as _,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use liveframe_core::{
    HandlerError, Message, MessageMap, Namespace, RenderError, RequestContext, Response,
    SessionRegistry, State,
};

/// Add the integer argument to the counter.
pub const INCREMENT_COUNTER: &str = "INCREMENT_COUNTER";
/// Add the integer argument now and again right after, through a zero-delay
/// follow-up.
pub const DOUBLE_STEP: &str = "DOUBLE_STEP";
/// Start the tick loop.
pub const START_LOOP: &str = "START_LOOP";
/// One loop iteration; reschedules itself until stopped.
pub const TICK: &str = "TICK";
/// Stop the tick loop.
pub const STOP_LOOP: &str = "STOP_LOOP";
/// Panic inside the handler.
pub const CRASH_ME: &str = "CRASH_ME";
/// Mutate, then return an error.
pub const REJECT: &str = "REJECT";
/// Make every later render fail.
pub const BREAK_RENDER: &str = "BREAK_RENDER";
/// Append the string argument to the shared chat log and broadcast.
pub const SEND_MESSAGE: &str = "SEND_MESSAGE";
/// Flip a namespaced toggle.
pub const TOGGLE: &str = "TOGGLE";

/// Delay between ticks.
pub const TICK_INTERVAL: Duration = Duration::from_millis(33);

/// Toggle component instance ids.
pub const TOGGLES: [&str; 2] = ["left", "right"];

/// Chat history shared by every session of a runtime.
#[derive(Debug, Clone, Default)]
pub struct ChatLog(Arc<Mutex<Vec<String>>>);

impl ChatLog {
    /// Append a line.
    pub fn push(&self, line: String) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(line);
    }

    /// Copy of every line.
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Model exercising every runtime feature.
#[derive(Debug, Clone)]
pub struct TestModel {
    /// Counter value
    pub counter: i64,
    /// Ticks run since the loop last started
    pub ticks: u64,
    /// Stop flag checked by every tick
    pub stopped: bool,
    /// Makes render fail
    pub broken: bool,
    /// Current route
    pub route: String,
    /// Routes seen by the route change hook, oldest first
    pub route_history: Vec<String>,
    /// Toggle component states by instance id
    pub toggles: BTreeMap<String, bool>,
    /// Display name from the `user` query parameter
    pub user: String,
    chat: ChatLog,
    registry: SessionRegistry,
}

impl State for TestModel {
    type Shared = ChatLog;

    fn init(request: &RequestContext, shared: &ChatLog) -> Self {
        Self {
            counter: 0,
            ticks: 0,
            stopped: false,
            broken: false,
            route: "/".to_string(),
            route_history: Vec::new(),
            toggles: TOGGLES.iter().map(|id| ((*id).to_string(), false)).collect(),
            user: request.query("user").unwrap_or("anon").to_string(),
            chat: shared.clone(),
            registry: request.registry().clone(),
        }
    }

    fn update(&self) -> MessageMap<Self> {
        let own = MessageMap::new()
            .with(INCREMENT_COUNTER, increment)
            .with(DOUBLE_STEP, double_step)
            .with(START_LOOP, start_loop)
            .with(TICK, tick)
            .with(STOP_LOOP, stop_loop)
            .with(CRASH_ME, crash)
            .with(REJECT, reject)
            .with(BREAK_RENDER, break_render)
            .with(SEND_MESSAGE, send_message);

        TOGGLES.iter().fold(own, |map, id| {
            map.merge(Namespace::new(*id).qualify_map(toggle_component(id)))
        })
    }

    fn render(&self) -> Result<Vec<u8>, RenderError> {
        if self.broken {
            return Err(RenderError::msg("render broken on purpose"));
        }

        let mut out = String::new();
        let _ = writeln!(out, "route={}", self.route);
        let _ = writeln!(out, "user={}", self.user);
        let _ = writeln!(out, "counter={}", self.counter);
        let _ = writeln!(out, "ticks={}", self.ticks);
        for (id, on) in &self.toggles {
            let _ = writeln!(out, "{id}={}", if *on { "on" } else { "off" });
        }
        let _ = writeln!(out, "chat={}", self.chat.lines().join("|"));
        Ok(out.into_bytes())
    }

    fn route(&self) -> &str {
        &self.route
    }

    fn set_route(&mut self, route: &str) {
        self.route = route.to_string();
    }

    fn on_route_change(&mut self, new_route: &str) {
        self.route_history.push(new_route.to_string());
    }
}

fn increment(message: &Message, model: &mut TestModel) -> Response {
    match message.args.decode_int() {
        Ok(step) => {
            model.counter += step;
            Response::ok()
        },
        Err(err) => Response::error(err),
    }
}

fn double_step(message: &Message, model: &mut TestModel) -> Response {
    match message.args.decode_int() {
        Ok(step) => {
            model.counter += step;
            Response::next(Message::new(INCREMENT_COUNTER, serde_json::Value::from(step)))
        },
        Err(err) => Response::error(err),
    }
}

fn start_loop(_: &Message, model: &mut TestModel) -> Response {
    model.stopped = false;
    model.ticks = 0;
    Response::next_after(Message::without_args(TICK), TICK_INTERVAL)
}

fn tick(_: &Message, model: &mut TestModel) -> Response {
    if model.stopped {
        return Response::ok();
    }
    model.ticks += 1;
    Response::next_after(Message::without_args(TICK), TICK_INTERVAL)
}

fn stop_loop(_: &Message, model: &mut TestModel) -> Response {
    model.stopped = true;
    Response::ok()
}

#[allow(clippy::panic)]
fn crash(_: &Message, model: &mut TestModel) -> Response {
    model.counter = i64::MIN;
    panic!("crashed on purpose")
}

fn reject(_: &Message, model: &mut TestModel) -> Response {
    model.counter = i64::MAX;
    Response::error(HandlerError::msg("rejected on purpose"))
}

fn break_render(_: &Message, model: &mut TestModel) -> Response {
    model.broken = true;
    Response::ok()
}

fn send_message(message: &Message, model: &mut TestModel) -> Response {
    let text = match message.args.decode_string() {
        Ok(text) => text,
        Err(err) => return Response::error(err),
    };
    model.chat.push(format!("{}: {}", model.user, text));
    model.registry.broadcast();
    Response::ok()
}

fn toggle_component(id: &str) -> MessageMap<TestModel> {
    let id = id.to_string();
    MessageMap::new().with(TOGGLE, move |_, model: &mut TestModel| {
        let on = model.toggles.entry(id.clone()).or_default();
        *on = !*on;
        Response::ok()
    })
}
