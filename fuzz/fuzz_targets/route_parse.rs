#![no_main]

use libfuzzer_sys::fuzz_target;
use liveframe_core::routing::{route_param, route_path};

fuzz_target!(|data: &[u8]| {
    let Ok(route) = std::str::from_utf8(data) else {
        return;
    };

    let _ = route_path(route);
    let _ = route_param(route, "user");
});
