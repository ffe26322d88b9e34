//! Server-driven animation.
//!
//! A bouncing ball moved entirely by the server: each frame moves the ball one
//! step and schedules the next frame after one frame interval.
//!
//! Every start, stop and reset opens a new generation. Scheduled frames carry
//! the generation that scheduled them, and a frame from an older generation
//! ends its chain, so at most one chain is ever live.

use std::time::Duration;

use liveframe_core::{Message, MessageMap, Response};
use liveframe_proto::js;
use rand::Rng;

use super::DemoModel;
use crate::html::button;

/// Start the loop. With a generation argument, run one scheduled frame.
pub const START_ANIMATION: &str = "START_ANIMATION";
/// Set the stop flag.
pub const STOP_ANIMATION: &str = "STOP_ANIMATION";
/// Stop and recentre the ball.
pub const RESET_ANIMATION: &str = "RESET_ANIMATION";

/// Delay between frames (about 30 fps).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

const BACKGROUND_SIZE: i32 = 300;
const BALL_SIZE: i32 = 20;
const MAX_STEP: i32 = 5;

/// Ball position in percent of the background, plus direction of travel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    /// Loop stop flag
    pub stop: bool,
    /// Horizontal position, 0..=100
    pub x: i32,
    /// Vertical position, 0..=100
    pub y: i32,
    dx: i32,
    dy: i32,
    generation: u64,
}

impl Default for Animation {
    fn default() -> Self {
        Self { stop: true, x: 50, y: 50, dx: 1, dy: 1, generation: 0 }
    }
}

impl Animation {
    fn step(&mut self, rng: &mut impl Rng) {
        if self.x >= 100 {
            self.dx = -rng.gen_range(1..=MAX_STEP);
        } else if self.x <= 0 {
            self.dx = rng.gen_range(1..=MAX_STEP);
        }
        if self.y >= 100 {
            self.dy = -rng.gen_range(1..=MAX_STEP);
        } else if self.y <= 0 {
            self.dy = rng.gen_range(1..=MAX_STEP);
        }
        self.x = (self.x + self.dx).clamp(0, 100);
        self.y = (self.y + self.dy).clamp(0, 100);
    }

    /// Stop the loop and orphan every frame already scheduled.
    pub(crate) fn halt(&mut self) {
        self.stop = true;
        self.next_generation();
    }

    fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    fn frame(&self) -> Response {
        Response::next_after(
            Message::new(START_ANIMATION, serde_json::Value::from(self.generation)),
            FRAME_INTERVAL,
        )
    }

    fn translate(position: i32) -> i32 {
        position * (BACKGROUND_SIZE - BALL_SIZE) / 100
    }
}

pub(crate) fn messages() -> MessageMap<DemoModel> {
    MessageMap::new()
        .with(START_ANIMATION, start)
        .with(STOP_ANIMATION, stop)
        .with(RESET_ANIMATION, reset)
}

fn start(message: &Message, model: &mut DemoModel) -> Response {
    let animation = &mut model.animation;

    match message.args.as_value().as_u64() {
        Some(generation) => {
            if animation.stop || generation != animation.generation {
                return Response::ok();
            }
        },
        None => {
            if !animation.stop {
                return Response::ok();
            }
            animation.stop = false;
            animation.next_generation();
        },
    }

    animation.step(&mut rand::thread_rng());
    animation.frame()
}

fn stop(_: &Message, model: &mut DemoModel) -> Response {
    model.animation.halt();
    Response::ok()
}

fn reset(_: &Message, model: &mut DemoModel) -> Response {
    let generation = model.animation.next_generation();
    model.animation = Animation { generation, ..Animation::default() };
    Response::ok()
}

pub(crate) fn render(animation: &Animation) -> String {
    format!(
        "<h2>A server-driven animation</h2>\
         <p>Every frame is a message the server sends itself {ms}ms after the last one.</p>\
         {start}{stop}{reset}\
         <p>Coordinates: ({x}, {y})</p>\
         <div id=\"animation-background\" style=\"position:relative;width:{bg}px;height:{bg}px\">\
         <div id=\"animation-ball\" style=\"width:{ball}px;height:{ball}px;transform:translate({tx}px, {ty}px)\"></div>\
         </div>",
        ms = FRAME_INTERVAL.as_millis(),
        start = button(&js::send_message_no_args(START_ANIMATION), "Start"),
        stop = button(&js::send_message_no_args(STOP_ANIMATION), "Stop"),
        reset = button(&js::send_message_no_args(RESET_ANIMATION), "Reset"),
        x = animation.x,
        y = animation.y,
        bg = BACKGROUND_SIZE,
        ball = BALL_SIZE,
        tx = Animation::translate(animation.x),
        ty = Animation::translate(animation.y),
    )
}

#[cfg(test)]
mod tests {
    use liveframe_core::{ConnectRequest, SessionAction};
    use liveframe_harness::TestSession;
    use serde_json::json;

    use super::*;
    use crate::demo::DemoShared;

    fn session() -> TestSession<DemoModel> {
        TestSession::init(&ConnectRequest::new("/animation"), &DemoShared::default())
    }

    #[test]
    fn start_schedules_next_frame() {
        let mut session = session();

        let actions = session.dispatch(START_ANIMATION, json!(null)).expect("start");
        assert!(matches!(
            actions.last(),
            Some(SessionAction::Schedule(next)) if next.delay == FRAME_INTERVAL
        ));
        assert!(!session.state().animation.stop);
    }

    #[test]
    fn stop_ends_the_chain() {
        let mut session = session();
        session.dispatch(START_ANIMATION, json!(null)).expect("start");
        session.run_next_follow_up().expect("frame queued").expect("frame runs");

        session.dispatch(STOP_ANIMATION, json!(null)).expect("stop");
        session.run_next_follow_up().expect("frame queued").expect("frame runs");
        assert_eq!(session.pending_follow_ups().count(), 0);
    }

    #[test]
    fn ball_stays_in_bounds() {
        let mut animation = Animation { stop: false, x: 99, y: 1, dx: 5, dy: -5, generation: 1 };
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            animation.step(&mut rng);
            assert!((0..=100).contains(&animation.x));
            assert!((0..=100).contains(&animation.y));
        }
    }

    #[test]
    fn reset_recentres() {
        let mut session = session();
        session.dispatch(START_ANIMATION, json!(null)).expect("start");
        session.dispatch(RESET_ANIMATION, json!(null)).expect("reset");

        let animation = &session.state().animation;
        assert!(animation.stop);
        assert_eq!((animation.x, animation.y), (50, 50));
    }

    fn run_frames(session: &mut TestSession<DemoModel>) {
        let queued = session.pending_follow_ups().count();
        for _ in 0..queued {
            session.run_next_follow_up().expect("frame queued").expect("frame runs");
        }
    }

    #[test]
    fn second_start_click_does_not_fork_the_loop() {
        let mut session = session();
        session.dispatch(START_ANIMATION, json!(null)).expect("start");
        session.dispatch(START_ANIMATION, json!(null)).expect("start again");
        assert_eq!(session.pending_follow_ups().count(), 1);

        run_frames(&mut session);
        assert_eq!(session.pending_follow_ups().count(), 1);
    }

    #[test]
    fn stop_then_start_within_a_frame_keeps_one_chain() {
        let mut session = session();
        session.dispatch(START_ANIMATION, json!(null)).expect("start");
        session.dispatch(STOP_ANIMATION, json!(null)).expect("stop");
        session.dispatch(START_ANIMATION, json!(null)).expect("restart");
        assert_eq!(session.pending_follow_ups().count(), 2);

        run_frames(&mut session);
        assert_eq!(session.pending_follow_ups().count(), 1);
        run_frames(&mut session);
        assert_eq!(session.pending_follow_ups().count(), 1);
    }

    #[test]
    fn reset_then_start_within_a_frame_keeps_one_chain() {
        let mut session = session();
        session.dispatch(START_ANIMATION, json!(null)).expect("start");
        session.dispatch(RESET_ANIMATION, json!(null)).expect("reset");
        session.dispatch(START_ANIMATION, json!(null)).expect("restart");

        run_frames(&mut session);
        assert_eq!(session.pending_follow_ups().count(), 1);
    }
}
