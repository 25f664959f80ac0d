use super::SlashCommand;

#[test]
fn it_parse_empty_string() {
    let text = "";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_space_only() {
    let text = " ";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_single_slash() {
    let text = "/";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_invalid_prefix() {
    let text = "!q";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_plain_message() {
    let text = "what does chapter 2 say about duty?";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_valid_prefix() {
    let text = "/q";
    let cmd = SlashCommand::parse(text);
    assert!(cmd.is_some());
    assert_eq!(cmd.unwrap().command, "/q");
}

#[test]
fn it_is_short_quit() {
    let cmd = SlashCommand::parse("/q").unwrap();
    assert!(cmd.is_quit());
}
#[test]
fn it_is_exit() {
    let cmd = SlashCommand::parse("/exit").unwrap();
    assert!(cmd.is_quit());
}
#[test]
fn it_is_not_is_quit() {
    let cmd = SlashCommand::parse("/clear").unwrap();
    assert!(!cmd.is_quit());
}

#[test]
fn it_is_clear() {
    assert!(SlashCommand::parse("/c").unwrap().is_clear());
    assert!(SlashCommand::parse("/clear").unwrap().is_clear());
}

#[test]
fn it_is_delete_with_id() {
    let cmd = SlashCommand::parse("/delete  abc-123").unwrap();
    assert!(cmd.is_delete());
    assert_eq!(cmd.first_arg(), Some("abc-123"));
}
#[test]
fn it_is_not_delete_without_id() {
    assert!(SlashCommand::parse("/d").is_none());
}

#[test]
fn it_is_language() {
    let cmd = SlashCommand::parse("/lang marathi").unwrap();
    assert!(cmd.is_language());
    assert_eq!(cmd.first_arg(), Some("marathi"));
}

#[test]
fn it_is_persona() {
    let cmd = SlashCommand::parse("/p sakhi").unwrap();
    assert!(cmd.is_persona());
    assert_eq!(cmd.first_arg(), Some("sakhi"));
}

#[test]
fn it_is_cancel() {
    assert!(SlashCommand::parse("/x").unwrap().is_cancel());
}

#[test]
fn it_is_history() {
    assert!(SlashCommand::parse("/history").unwrap().is_history());
}

#[test]
fn it_is_sign_in_with_credentials() {
    let cmd = SlashCommand::parse("/signin seeker@example.com secret").unwrap();
    assert!(cmd.is_sign_in());
    assert_eq!(cmd.args, vec!["seeker@example.com", "secret"]);
}
#[test]
fn it_is_not_sign_in_without_password() {
    assert!(SlashCommand::parse("/login seeker@example.com").is_none());
}

#[test]
fn it_is_sign_out() {
    assert!(SlashCommand::parse("/logout").unwrap().is_sign_out());
}

#[test]
fn it_is_help() {
    assert!(SlashCommand::parse("/h").unwrap().is_help());
}
