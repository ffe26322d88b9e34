#![no_main]

use libfuzzer_sys::fuzz_target;
use liveframe_proto::{MAX_FRAME_SIZE, Message};

fuzz_target!(|data: &[u8]| {
    let Ok(message) = Message::decode(data, MAX_FRAME_SIZE) else {
        return;
    };
    assert!(!message.name.is_empty());

    // Every typed view of the payload either decodes or errors.
    let _ = message.args.decode_int();
    let _ = message.args.decode_string();
    let _ = message.args.to_display_string();

    let encoded = message.encode().expect("decoded message re-encodes");
    let again = Message::decode(&encoded, usize::MAX).expect("re-encoded message decodes");
    assert_eq!(again.name, message.name);
});
