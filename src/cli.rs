use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Conversational front-end over a JSON project snapshot.
/// Questions are answered directly; change requests print a command plan.
#[derive(Parser)]
#[command(name = "pma", version, about = "Project management assistant CLI")]
pub struct Cli {
    /// Path to the project JSON file.
    #[arg(long, global = true, default_value = "project.json")]
    pub project: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Answer a single question about the project.
    Ask {
        /// The question, e.g. "how many tasks are done?".
        utterance: Vec<String>,
    },

    /// Print the command plan for a single change request.
    Plan {
        /// The request, e.g. "move #5 to done".
        utterance: Vec<String>,
    },

    /// Interactive conversation; questions and change requests are routed
    /// automatically and pronouns resolve against earlier replies.
    Chat,
}
