use super::CompletionChoice;
use super::CompletionChoiceMessage;
use super::CompletionResponse;
use crate::domain::models::ChatError;

#[test]
fn it_extracts_text() {
    let res = CompletionResponse {
        choices: vec![CompletionChoice {
            message: Some(CompletionChoiceMessage {
                content: Some("Om Shanti".to_string()),
            }),
        }],
    };

    assert_eq!(res.into_text(), Ok("Om Shanti".to_string()));
}

#[test]
fn it_flags_missing_choices() {
    let res: CompletionResponse = serde_json::from_str("{}").unwrap();
    assert!(matches!(
        res.into_text(),
        Err(ChatError::MalformedResponse(_))
    ));
}

#[test]
fn it_flags_missing_content() {
    let res: CompletionResponse =
        serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
    assert!(matches!(
        res.into_text(),
        Err(ChatError::MalformedResponse(_))
    ));
}

#[test]
fn it_flags_empty_content() {
    let res: CompletionResponse =
        serde_json::from_str(r#"{"choices":[{"message":{"content":""}}]}"#).unwrap();
    assert!(matches!(
        res.into_text(),
        Err(ChatError::MalformedResponse(_))
    ));
}
