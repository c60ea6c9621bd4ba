//! Conversation history and pronoun referent resolution.
//!
//! The caller owns the history and passes it in on every call; nothing here
//! is persisted. Pronouns ("them", "it", "the first one") resolve against
//! the most recent assistant turn that enumerated task IDs; that turn's
//! `#<digits>` tokens become the referent pool.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::extract::find_task_ids;

static PRONOUN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:them|those|these|it|that one|this one)\b").unwrap()
});

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of the conversation, oldest first in a history slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        ConversationTurn { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ConversationTurn { role: Role::Assistant, content: content.into() }
    }
}

/// Resolve the referent pool: the task IDs listed by the most recent
/// assistant turn that mentioned any. Empty when no assistant turn in the
/// history references tasks.
pub fn resolve_referents(history: &[ConversationTurn]) -> BTreeSet<u64> {
    for turn in history.iter().rev() {
        if turn.role != Role::Assistant {
            continue;
        }
        let ids = find_task_ids(&turn.content);
        if !ids.is_empty() {
            return ids;
        }
    }
    BTreeSet::new()
}

/// Whether the utterance leans on a pronoun that needs a referent pool.
pub fn has_pronoun(utterance: &str) -> bool {
    PRONOUN_RE.is_match(utterance)
}

/// Content of the most recent assistant turn, if any.
pub fn last_assistant_turn(history: &[ConversationTurn]) -> Option<&str> {
    history
        .iter()
        .rev()
        .find(|t| t.role == Role::Assistant)
        .map(|t| t.content.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referents_from_most_recent_assistant_listing() {
        let history = vec![
            ConversationTurn::user("list high priority tasks"),
            ConversationTurn::assistant("Task #3: Fix login crash\nTask #1: Set up CI pipeline"),
            ConversationTurn::user("thanks"),
            ConversationTurn::assistant("You're welcome."),
            ConversationTurn::user("show them again"),
        ];
        // The latest assistant turn with IDs wins, even with later turns present.
        assert_eq!(resolve_referents(&history), BTreeSet::from([1, 3]));
    }

    #[test]
    fn test_referents_prefer_newest_listing() {
        let history = vec![
            ConversationTurn::assistant("Task #12: Old\nTask #7: Older"),
            ConversationTurn::assistant("Task #4: Newest"),
        ];
        assert_eq!(resolve_referents(&history), BTreeSet::from([4]));
    }

    #[test]
    fn test_referents_ignore_user_turns() {
        let history = vec![
            ConversationTurn::user("what about #9?"),
            ConversationTurn::assistant("Nothing listed yet."),
        ];
        assert!(resolve_referents(&history).is_empty());
        assert!(resolve_referents(&[]).is_empty());
    }

    #[test]
    fn test_pronoun_detection() {
        assert!(has_pronoun("assign all of them to me"));
        assert!(has_pronoun("what about that one?"));
        assert!(!has_pronoun("list all tasks"));
    }

    #[test]
    fn test_last_assistant_turn() {
        let history = vec![
            ConversationTurn::assistant("There are 3 tasks that are todo."),
            ConversationTurn::user("why?"),
        ];
        assert_eq!(
            last_assistant_turn(&history),
            Some("There are 3 tasks that are todo.")
        );
        assert_eq!(last_assistant_turn(&[]), None);
    }
}
