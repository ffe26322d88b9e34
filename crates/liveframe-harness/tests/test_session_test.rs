//! Handler-level tests driven through `TestSession`.
//!
//! No runtime and no timers: every dispatch runs inline and follow-ups are
//! stepped manually.

use liveframe_core::{ConnectRequest, DispatchError, HandlerError, SessionAction, routing};
use liveframe_harness::{
    TestSession,
    fixtures::{
        BREAK_RENDER, CRASH_ME, ChatLog, INCREMENT_COUNTER, REJECT, SEND_MESSAGE, START_LOOP,
        STOP_LOOP, TICK, TICK_INTERVAL, TOGGLE, TestModel,
    },
};
use serde_json::json;

fn session() -> TestSession<TestModel> {
    TestSession::init(&ConnectRequest::new("/"), &ChatLog::default())
}

#[test]
fn counter_increments_and_decrements() {
    let mut session = session();

    let actions = session.dispatch(INCREMENT_COUNTER, json!(1)).expect("increment");
    assert_eq!(actions.len(), 1);
    assert_eq!(session.state().counter, 1);
    assert!(session.render_string().contains("counter=1"));

    session.dispatch(INCREMENT_COUNTER, json!(-1)).expect("decrement");
    assert_eq!(session.state().counter, 0);
    assert!(session.render_string().contains("counter=0"));
    assert_eq!(session.frames().len(), 2);
}

#[test]
fn unknown_message_pushes_nothing() {
    let mut session = session();

    let err = session.dispatch("DOES_NOT_EXIST", json!(null)).unwrap_err();
    assert!(matches!(err, DispatchError::UnknownMessage { .. }));
    assert!(session.frames().is_empty());
    assert_eq!(session.state().counter, 0);
}

#[test]
fn wrong_argument_type_shows_error_view() {
    let mut session = session();

    let err = session.dispatch(INCREMENT_COUNTER, json!("ten")).unwrap_err();
    assert!(matches!(err, DispatchError::Handler { source: HandlerError::Decode(_), .. }));

    let frame = session.last_frame().expect("error frame");
    assert!(frame.is_error());
    assert!(frame.text().contains("Whoops!"));
    assert_eq!(session.state().counter, 0);
}

#[test]
fn crash_is_contained_and_state_survives() {
    let mut session = session();
    session.dispatch(INCREMENT_COUNTER, json!(3)).expect("increment");

    let err = session.dispatch(CRASH_ME, json!(null)).unwrap_err();
    assert!(matches!(err, DispatchError::Handler { source: HandlerError::Panicked(_), .. }));
    assert_eq!(session.state().counter, 3);

    session.dispatch(INCREMENT_COUNTER, json!(1)).expect("session keeps working");
    assert_eq!(session.state().counter, 4);
}

#[test]
fn rejected_handler_does_not_commit() {
    let mut session = session();

    assert!(session.dispatch(REJECT, json!(null)).is_err());
    assert_eq!(session.state().counter, 0);
    assert!(session.last_frame().expect("error frame").text().contains("rejected on purpose"));
}

#[test]
fn broken_render_falls_back_to_error_view() {
    let mut session = session();

    session.dispatch(BREAK_RENDER, json!(null)).expect("handler succeeds");
    let frame = session.last_frame().expect("frame");
    assert!(frame.is_error());
    assert!(frame.text().contains("render broken on purpose"));
}

#[test]
fn loop_runs_until_stopped() {
    let mut session = session();

    let actions = session.dispatch(START_LOOP, json!(null)).expect("start");
    assert!(matches!(
        actions.last(),
        Some(SessionAction::Schedule(follow_up))
            if follow_up.message.name == TICK && follow_up.delay == TICK_INTERVAL
    ));

    for _ in 0..3 {
        session.run_next_follow_up().expect("tick queued").expect("tick runs");
    }
    assert_eq!(session.state().ticks, 3);

    session.dispatch(STOP_LOOP, json!(null)).expect("stop");
    let actions = session.run_next_follow_up().expect("tick queued").expect("tick runs");
    assert_eq!(actions.len(), 1, "stopped tick must not reschedule");
    assert!(session.run_next_follow_up().is_none());
    assert_eq!(session.state().ticks, 3);
}

#[test]
fn namespaced_toggles_are_independent() {
    let mut session = session();

    session.dispatch("left_TOGGLE", json!(null)).expect("left toggle");
    assert!(session.render_string().contains("left=on"));
    assert!(session.render_string().contains("right=off"));

    assert!(matches!(
        session.dispatch(TOGGLE, json!(null)),
        Err(DispatchError::UnknownMessage { .. })
    ));
}

#[test]
fn connect_route_runs_hook() {
    let session: TestSession<TestModel> =
        TestSession::init(&ConnectRequest::new("/chat"), &ChatLog::default());

    assert_eq!(session.state().route, "/chat");
    assert_eq!(session.state().route_history, vec!["/chat".to_string()]);
}

#[test]
fn change_route_message() {
    let mut session = session();

    session.dispatch(routing::CHANGE_ROUTE, json!("/counter")).expect("route change");
    assert_eq!(session.state().route, "/counter");
    assert!(session.render_string().contains("route=/counter"));
}

#[test]
fn query_parameters_reach_init() {
    let request = ConnectRequest::new("/chat").with_query("user", "ada");
    let mut session: TestSession<TestModel> = TestSession::init(&request, &ChatLog::default());

    session.dispatch(SEND_MESSAGE, json!("hello")).expect("send");
    assert!(session.render_string().contains("chat=ada: hello"));
}

#[test]
fn closed_session_refuses_dispatch() {
    let mut session = session();
    session.dispatch(START_LOOP, json!(null)).expect("start");
    session.close();

    assert!(session.run_next_follow_up().is_none());
    assert!(matches!(
        session.dispatch(INCREMENT_COUNTER, json!(1)),
        Err(DispatchError::ConnectionClosed { .. })
    ));
}

#[test]
fn render_twice_is_identical() {
    let mut session = session();
    session.dispatch(INCREMENT_COUNTER, json!(7)).expect("increment");

    assert_eq!(session.render_string(), session.render_string());
}
