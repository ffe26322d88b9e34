//! Client call snippets for views.
//!
//! Views wire user interaction to messages by embedding calls to the client
//! script's global `liveframe` object, e.g. in an `onclick` attribute. These
//! builders produce those calls with every interpolated value JSON-escaped.
//! The result still has to be attribute-escaped by whatever builds the HTML.
//!
//! Arguments travel as JSON text inside a JS string literal; the client
//! parses them back before sending the envelope.

use serde::Serialize;
use serde_json::Value;

/// Name of the client-side global the snippets call into.
pub const CLIENT_GLOBAL: &str = "liveframe";

fn quote(text: &str) -> String {
    Value::String(text.to_owned()).to_string()
}

/// `liveframe.sendMessage(name, args)`.
///
/// Arguments that fail to serialize are sent as `null`.
pub fn send_message<T: Serialize + ?Sized>(name: &str, args: &T) -> String {
    let json = serde_json::to_string(args).unwrap_or_else(|_| "null".to_owned());
    format!("{CLIENT_GLOBAL}.sendMessage({}, {})", quote(name), quote(&json))
}

/// `liveframe.sendMessage(name, null)`.
pub fn send_message_no_args(name: &str) -> String {
    format!("{CLIENT_GLOBAL}.sendMessage({}, \"null\")", quote(name))
}

/// Send the current value of the input element with id `input_id`.
pub fn send_message_with_value(name: &str, input_id: &str) -> String {
    format!("{CLIENT_GLOBAL}.sendMessageWithValue({}, {})", quote(name), quote(input_id))
}

/// Send the fields of the form with id `form_id` as an object payload.
pub fn submit_form(name: &str, form_id: &str) -> String {
    format!("{CLIENT_GLOBAL}.submitForm({}, {})", quote(name), quote(form_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_message_encodes_number() {
        insta::assert_snapshot!(
            send_message("INCREMENT_COUNTER", &-1),
            @r#"liveframe.sendMessage("INCREMENT_COUNTER", "-1")"#
        );
    }

    #[test]
    fn send_message_encodes_string_payload() {
        insta::assert_snapshot!(
            send_message("SELECT_COLOR", "#FF0000"),
            @r##"liveframe.sendMessage("SELECT_COLOR", "\"#FF0000\"")"##
        );
    }

    #[test]
    fn no_args_sends_null() {
        insta::assert_snapshot!(
            send_message_no_args("START_LOOP"),
            @r#"liveframe.sendMessage("START_LOOP", "null")"#
        );
    }

    #[test]
    fn names_are_escaped() {
        let call = send_message_no_args("a\"b");
        assert_eq!(call, r#"liveframe.sendMessage("a\"b", "null")"#);
    }

    #[test]
    fn input_and_form_helpers() {
        assert_eq!(
            send_message_with_value("SEND_MESSAGE", "messageInput"),
            r#"liveframe.sendMessageWithValue("SEND_MESSAGE", "messageInput")"#
        );
        assert_eq!(
            submit_form("FORM_SUBMIT", "signup"),
            r#"liveframe.submitForm("FORM_SUBMIT", "signup")"#
        );
    }
}
