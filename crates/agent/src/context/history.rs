//! Conversation state reconstruction.
//!
//! The caller owns the conversation and hands it back on every call as
//! ordered `(user, assistant)` exchanges. This turns that history into
//! role-tagged messages, oldest first.

use groundwire_config::HistoryMode;
use groundwire_core::message::{Exchange, Message};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConversationReconstructor {
    mode: HistoryMode,
}

impl ConversationReconstructor {
    pub fn new(mode: HistoryMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> HistoryMode {
        self.mode
    }

    /// Messages emitted per exchange.
    pub fn messages_per_exchange(&self) -> usize {
        match self.mode {
            HistoryMode::Single => 2,
            HistoryMode::DuplicateAssistant => 3,
        }
    }

    /// Expand `history` into messages, preserving order. Never mutates it.
    pub fn reconstruct(&self, history: &[Exchange]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() * self.messages_per_exchange());
        for exchange in history {
            messages.push(Message::user(&exchange.user));
            messages.push(Message::assistant(&exchange.assistant));
            if self.mode == HistoryMode::DuplicateAssistant {
                messages.push(Message::assistant(&exchange.assistant));
            }
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundwire_core::message::Role;

    fn history() -> Vec<Exchange> {
        vec![
            Exchange::new("hi", "hello! how can I help?"),
            Exchange::new("pizza?", "Try Di Fara."),
        ]
    }

    #[test]
    fn empty_history_is_empty() {
        assert!(ConversationReconstructor::default().reconstruct(&[]).is_empty());
    }

    #[test]
    fn single_mode_alternates_user_and_assistant() {
        let messages = ConversationReconstructor::default().reconstruct(&history());
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(messages[0].content, "hi");
        assert_eq!(messages[3].content, "Try Di Fara.");
    }

    #[test]
    fn duplicate_mode_repeats_assistant() {
        let reconstructor = ConversationReconstructor::new(HistoryMode::DuplicateAssistant);
        assert_eq!(reconstructor.mode(), HistoryMode::DuplicateAssistant);
        let messages = reconstructor.reconstruct(&history());
        assert_eq!(messages.len(), 6);
        assert_eq!(messages[1], messages[2]);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[3].content, "pizza?");
    }

    #[test]
    fn history_is_left_untouched() {
        let h = history();
        let before = h.clone();
        ConversationReconstructor::default().reconstruct(&h);
        assert_eq!(h, before);
    }
}
