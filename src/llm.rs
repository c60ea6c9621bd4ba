//! Pluggable free-text generation.
//!
//! The engine itself is deterministic; a [`TextGenerator`] is only consulted
//! when every rule-based path has declined an utterance. Callers inject an
//! implementation (or none) so the core stays free of network concerns and
//! tests can substitute canned generators.

/// A source of free-text completions for utterances the rule-based engine
/// cannot answer.
pub trait TextGenerator {
    /// Produce a completion for `prompt`. Errors are reported as strings;
    /// the caller degrades to a deterministic reply on failure.
    fn complete(&self, prompt: &str) -> Result<String, String>;
}

/// Generator that always declines. Useful as an explicit "no fallback"
/// marker in configuration code.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGenerator;

impl TextGenerator for NoGenerator {
    fn complete(&self, _prompt: &str) -> Result<String, String> {
        Err("no text generator configured".to_string())
    }
}
