//! Deterministic natural-language engine for a task-management assistant.
//!
//! The engine turns free-text utterances about a project's tasks into either
//! a formatted answer (for questions) or a structured [`CommandPlan`] (for
//! change requests), without mutating anything itself. The pipeline is
//! rule-based and reproducible: entity extraction, pronoun referent
//! resolution against the conversation history, intent classification, then
//! answering or planning. An optional [`TextGenerator`] handles only the
//! utterances no rule recognises.
//!
//! [`CommandPlan`]: plan::CommandPlan
//! [`TextGenerator`]: llm::TextGenerator

pub mod answer;
pub mod assistant;
pub mod cli;
pub mod context;
pub mod dates;
pub mod extract;
pub mod fields;
pub mod intent;
pub mod llm;
pub mod plan;
pub mod project;
pub mod task;

#[cfg(test)]
pub(crate) mod testutil;

pub use assistant::Assistant;
pub use context::{ConversationTurn, Role};
pub use fields::{AssigneeRef, Priority, Status};
pub use intent::{Intent, QuestionIntent};
pub use llm::TextGenerator;
pub use plan::CommandPlan;
pub use project::{Project, TaskFilter};
pub use task::{Member, Task};
