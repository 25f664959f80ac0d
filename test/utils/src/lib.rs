use serde_json::json;

/// Body of a successful chat completion response.
pub fn completion_fixture(content: &str) -> String {
    return json!({
        "id": "gen-1",
        "model": "deepseek/deepseek-r1:free",
        "choices": [{
            "index": 0,
            "finish_reason": "stop",
            "message": {
                "role": "assistant",
                "content": content,
            },
        }],
    })
    .to_string();
}

pub fn gita_reply_fixture() -> &'static str {
    return r#"
🙏 Jai Shri Krishna! In Chapter 2, Verse 47, Shri Krishna tells Arjuna:

"Karmanye vadhikaraste ma phaleshu kadachana"

You have a right to your actions, but never to the fruits of your actions. Do your duty (dharma) with devotion and let go of the worry about results. 💫
"#
    .trim();
}
