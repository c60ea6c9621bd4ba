//! The top-level engine facade.
//!
//! An [`Assistant`] bundles the optional text-generation fallback and exposes
//! the two entry points the surrounding application routes to: answering an
//! informational utterance and planning a mutating one. Both take the project
//! snapshot and conversation history by reference on every call, so one
//! assistant can serve any number of projects and conversations.

use chrono::{Local, NaiveDate};

use crate::answer::answer_at;
use crate::context::ConversationTurn;
use crate::extract::extract;
use crate::intent::{classify, Intent};
use crate::llm::TextGenerator;
use crate::plan::{generate_plan_at, CommandPlan};
use crate::project::Project;

/// Deterministic conversational engine with an optional generative fallback.
pub struct Assistant {
    fallback: Option<Box<dyn TextGenerator>>,
}

impl Default for Assistant {
    fn default() -> Self {
        Assistant::new()
    }
}

impl Assistant {
    /// An assistant with no generative fallback; unrecognised utterances get
    /// a deterministic help reply.
    pub fn new() -> Self {
        Assistant { fallback: None }
    }

    /// An assistant that delegates unrecognised utterances to `generator`.
    pub fn with_fallback(generator: Box<dyn TextGenerator>) -> Self {
        Assistant { fallback: Some(generator) }
    }

    /// Classify an utterance so callers can route it to [`answer_question`]
    /// or [`generate_command_plan`].
    ///
    /// [`answer_question`]: Assistant::answer_question
    /// [`generate_command_plan`]: Assistant::generate_command_plan
    pub fn classify(&self, utterance: &str, history: &[ConversationTurn]) -> Intent {
        let entities = extract(utterance);
        let referents = crate::context::resolve_referents(history);
        classify(utterance, &entities, &referents, history)
    }

    /// Answer an informational utterance. Always returns a displayable
    /// string; never fails.
    pub fn answer_question(
        &self,
        project: &Project,
        utterance: &str,
        history: &[ConversationTurn],
        extra_context: Option<&str>,
    ) -> String {
        self.answer_question_at(project, utterance, history, extra_context, Local::now().date_naive())
    }

    /// Like [`Assistant::answer_question`] with an explicit reference date.
    pub fn answer_question_at(
        &self,
        project: &Project,
        utterance: &str,
        history: &[ConversationTurn],
        extra_context: Option<&str>,
        today: NaiveDate,
    ) -> String {
        answer_at(project, utterance, history, self.fallback.as_deref(), extra_context, today)
    }

    /// Plan a mutating utterance. The returned plan is a description only;
    /// executing it is the caller's business.
    pub fn generate_command_plan(
        &self,
        project: &Project,
        utterance: &str,
        history: &[ConversationTurn],
    ) -> CommandPlan {
        self.generate_command_plan_at(project, utterance, history, Local::now().date_naive())
    }

    /// Like [`Assistant::generate_command_plan`] with an explicit reference
    /// date.
    pub fn generate_command_plan_at(
        &self,
        project: &Project,
        utterance: &str,
        history: &[ConversationTurn],
        today: NaiveDate,
    ) -> CommandPlan {
        generate_plan_at(project, utterance, history, today)
    }
}
