//! Canned replies picked by substring match.
//!
//! A [`ReplyBook`] is an ordered list of rules; the first rule whose pattern
//! occurs in the message wins and the fallback answers everything else.
//! [`CannedDispatcher`] puts a book behind the [`Dispatcher`] trait so the
//! chat loop can run without a network.

use async_trait::async_trait;
use tracing::debug;

use crate::{DispatchError, DispatchRequest, Dispatcher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRule {
    pub pattern: String,
    pub response: String,
}

impl ReplyRule {
    #[must_use]
    pub fn new(pattern: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            response: response.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        text.contains(self.pattern.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyBook {
    rules: Vec<ReplyRule>,
    fallback: String,
}

impl ReplyBook {
    #[must_use]
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            fallback: fallback.into(),
        }
    }

    /// Append a rule. Rules are tried in insertion order.
    #[must_use]
    pub fn with_rule(mut self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push(ReplyRule::new(pattern, response));
        self
    }

    /// The stock fortune-teller rules.
    #[must_use]
    pub fn fortune() -> Self {
        Self::new("ขอโทษค่ะ ฉันไม่เข้าใจคำถามของคุณ")
            .with_rule("ดวง", "ดวงของคุณในวันนี้เป็นไปในทางที่ดี!")
            .with_rule("ชื่อ", "ชื่อของคุณมีความหมายว่า...")
    }

    #[must_use]
    pub fn reply(&self, text: &str) -> &str {
        self.rules
            .iter()
            .find(|rule| rule.matches(text))
            .map_or(self.fallback.as_str(), |rule| rule.response.as_str())
    }

    #[must_use]
    pub fn rules(&self) -> &[ReplyRule] {
        &self.rules
    }

    #[must_use]
    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

impl Default for ReplyBook {
    fn default() -> Self {
        Self::fortune()
    }
}

/// Offline dispatcher answering from a [`ReplyBook`].
#[derive(Debug, Clone, Default)]
pub struct CannedDispatcher {
    book: ReplyBook,
}

impl CannedDispatcher {
    #[must_use]
    pub const fn new(book: ReplyBook) -> Self {
        Self { book }
    }
}

#[async_trait]
impl Dispatcher for CannedDispatcher {
    async fn dispatch(&self, request: &DispatchRequest) -> Result<String, DispatchError> {
        let text = request.last_user_message().unwrap_or_default();
        let reply = self.book.reply(text);
        debug!("Canned reply for {} chars of input", text.chars().count());
        Ok(reply.to_string())
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatMessage, Role};

    #[test]
    fn first_matching_rule_wins() {
        let book = ReplyBook::new("fallback")
            .with_rule("a", "first")
            .with_rule("ab", "second");

        assert_eq!(book.reply("xab"), "first");
        assert_eq!(book.reply("b"), "fallback");
    }

    #[test]
    fn fortune_rules() {
        let book = ReplyBook::fortune();

        assert_eq!(book.reply("ดวง?"), "ดวงของคุณในวันนี้เป็นไปในทางที่ดี!");
        assert_eq!(book.reply("ชื่อฉันดีไหม"), "ชื่อของคุณมีความหมายว่า...");
        assert_eq!(book.reply("hello"), book.fallback());
        // Both patterns present: the earlier rule answers.
        assert_eq!(book.reply("ชื่อกับดวง"), "ดวงของคุณในวันนี้เป็นไปในทางที่ดี!");
    }

    #[test]
    fn empty_book_always_falls_back() {
        let book = ReplyBook::new("nothing");
        assert!(book.rules().is_empty());
        assert_eq!(book.reply(""), "nothing");
    }

    #[tokio::test]
    async fn canned_dispatcher_answers_last_user_message() {
        let dispatcher = CannedDispatcher::default();
        let request = DispatchRequest {
            messages: vec![
                ChatMessage {
                    role: Role::User,
                    content: "hello".to_string(),
                },
                ChatMessage {
                    role: Role::Assistant,
                    content: "hi".to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: "ดวงวันนี้".to_string(),
                },
            ],
            system_instruction: String::new(),
            model: "gemini-1.5-flash".to_string(),
            temperature: 0.7,
            max_output_tokens: 2048,
        };

        let reply = dispatcher.dispatch(&request).await;
        assert!(matches!(reply, Ok(ref r) if r == "ดวงของคุณในวันนี้เป็นไปในทางที่ดี!"));
    }
}
