use super::build_request;
use super::greeting;
use super::system_prompt;
use super::welcome;
use crate::domain::models::Language;
use crate::domain::models::Message;
use crate::domain::models::Persona;

#[test]
fn it_greets_brothers() {
    insta::assert_snapshot!(greeting(Persona::Brother), @"🙏 Jai Shri Krishna, mere Sakha! I'm truly blessed to be your spiritual guide. The wisdom of Bhagavad Gita is like a divine light that can illuminate our path. How may I assist you on your spiritual journey today? 🕉️");
}

#[test]
fn it_greets_sisters() {
    insta::assert_snapshot!(greeting(Persona::Sister), @"🙏 Jai Shri Krishna, meri Sakhi! I'm truly blessed to be your spiritual guide. The wisdom of Bhagavad Gita is like a divine light that can illuminate our path. How may I assist you on your spiritual journey today? 🕉️");
}

#[test]
fn it_mentions_the_daily_limit_in_the_welcome() {
    assert!(welcome(5).contains("only 5 messages per day"));
}

#[test]
fn it_switches_language_instructions() {
    assert!(system_prompt(Language::Hinglish).contains("in Hinglish (Hindi + English)"));
    assert!(system_prompt(Language::English).contains("Communicate warmly in English"));
    assert!(system_prompt(Language::Marathi).contains("Communicate warmly in Marathi"));
}

#[test]
fn it_builds_requests_in_order() {
    let history = vec![
        Message::user("Who are you?"),
        Message::assistant("I am Sakha."),
    ];
    let req = build_request("test-model", Language::English, &history, "Tell me about karma");

    assert_eq!(req.model, "test-model");
    let roles = req
        .messages
        .iter()
        .map(|e| return e.role.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
    assert_eq!(req.messages[1].content, "Who are you?");
    assert_eq!(req.messages[3].content, "Tell me about karma");
    assert_eq!(req.max_tokens, 1000);
    assert_eq!(req.presence_penalty, Some(0.6));
}

#[test]
fn it_serializes_the_upstream_payload() {
    let req = build_request("test-model", Language::English, &[], "Namaste");
    let mut value = serde_json::to_value(&req).unwrap();
    value["messages"][0]["content"] = serde_json::Value::String("<system>".to_string());

    insta::assert_snapshot!(serde_json::to_string(&value).unwrap(), @r###"{"frequency_penalty":0.5,"max_tokens":1000,"messages":[{"content":"<system>","role":"system"},{"content":"Namaste","role":"user"}],"model":"test-model","presence_penalty":0.6,"temperature":0.5,"top_p":0.9}"###);
}
