#[cfg(test)]
#[path = "prompts_test.rs"]
mod tests;

use crate::domain::models::CompletionMessage;
use crate::domain::models::CompletionRequest;
use crate::domain::models::Language;
use crate::domain::models::Message;
use crate::domain::models::Persona;

pub const CLARIFICATION_PROMPT: &str = "🙏 Please let me know if I should call you Sakha (brother) or Sakhi (sister). This will help me address you with the proper respect in our spiritual discussions. 💫";

pub const APOLOGY: &str = "🙏 Kripya mujhe maaf karein (Please forgive me). I'm having trouble connecting to the source of wisdom right now. Shall we try again in a moment? 🕊️";

pub const FAILURE_TOAST: &str = "Unable to connect. Please try again. 🙏";
pub const SEVERE_FAILURE_TOAST: &str =
    "We are experiencing technical difficulties. Please try again later. 🙏";

pub fn system_prompt(language: Language) -> String {
    let language_preference = language.instruction();

    return format!(
        r#"You are Sakha, a compassionate spiritual guide deeply versed in the Bhagavad Gita, created by Atharv Hatwar. {language_preference}.

Key guidelines for your responses:
1. Be warm, empathetic, and friendly in your communication
2. When citing the Gita, briefly explain the verse's meaning in simple terms
3. Use relevant examples from daily life to illustrate spiritual concepts
4. Include occasional Sanskrit terms with their meanings
5. End responses with a gentle word of encouragement
6. Keep responses concise yet meaningful (2-3 paragraphs maximum)
7. Use appropriate emojis to make the conversation warm and engaging
8. Address the user's emotional and spiritual needs with sensitivity
9. Sometimes ask user to donate some amount if they like the project by clicking on the support us button
10. If asked who created you, always mention "I was created by Atharv Hatwar to help guide spiritual seekers on their journey."

Remember: Your goal is to make ancient wisdom accessible and practical for modern life while maintaining a respectful, friendly tone."#
    );
}

pub fn welcome(daily_limit: u32) -> String {
    return format!("Namaste! 🙏 I'm delighted to meet you! Would you like me to call you Sakha (brother) or Sakhi (sister)? This will help me guide you better on your spiritual journey. 💫\n\nNote: You will have only {daily_limit} messages per day. This limit exists because it's a free service. We need to prevent spam and maintain the site. Thank you for your understanding. 🙏");
}

pub fn greeting(persona: Persona) -> String {
    let address = persona.address();
    return format!("🙏 Jai Shri Krishna, {address}! I'm truly blessed to be your spiritual guide. The wisdom of Bhagavad Gita is like a divine light that can illuminate our path. How may I assist you on your spiritual journey today? 🕉️");
}

pub fn daily_limit_reached(daily_limit: u32) -> String {
    return format!("You have reached your daily limit of {daily_limit} messages. Please come back tomorrow to continue our spiritual journey! 🙏\n\nWe maintain these limits to ensure quality service while keeping it free for all seekers.");
}

/// System prompt, then the prior `history` oldest first, then the new user
/// text as the final entry.
pub fn build_request(
    model: &str,
    language: Language,
    history: &[Message],
    text: &str,
) -> CompletionRequest {
    let mut messages = vec![CompletionMessage::new("system", &system_prompt(language))];
    messages.extend(history.iter().map(CompletionMessage::from));
    messages.push(CompletionMessage::new("user", text));

    return CompletionRequest::new(model, messages);
}
