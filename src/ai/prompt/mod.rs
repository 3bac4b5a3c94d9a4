//! Prompt Templates
//!
//! Title and script prompts are plain text with `{name}` placeholders. The
//! built-in wording can be replaced from configuration; rendering fails with
//! a configuration error if any placeholder has no value, so a half-filled
//! prompt never reaches the provider.

use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

use crate::config::PromptConfig;
use crate::types::{Result, TrailerError};

/// Default system prompt for free-form requests and script generation
pub const DEFAULT_SYSTEM_PROMPT: &str = "You narrate movie trailers. Reply with the spoken \
voice-over only, written for text-to-speech, no longer than 60 words.";

pub const TITLE_SYSTEM_PROMPT: &str = "You invent movie titles. Reply with the title alone \
as plain text: no quotes, no markdown, no commentary.";

pub const TITLE_TEMPLATE: &str = "Invent a title for a movie with these elements:
Genre: {genre}
Main Character: {main_character}
Setting: {setting}
Conflict: {conflict}
Plot Twist: {plot_twist}

Rules:
- One to five words, easy to remember
- Match the genre and tone
- Avoid generic titles
- Reply with the title only";

pub const SCRIPT_TEMPLATE: &str = "Write the narrator's voice-over for the trailer of \"{title}\".

Genre: {genre}
Setting: {setting}
Main Character: {main_character}
Conflict: {conflict}
Plot Twist: {plot_twist}

Rules:
- Spoken words only: no scene directions, sound cues or stage notes
- Hint at the plot twist without giving it away
- Put one or two words per sentence in UPPERCASE for emphasis
- Use commas, periods and dashes to pace the read
- One sentence per line, at most 60 words in total
- Finish with the title";

fn placeholder_pattern() -> &'static Regex {
    static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| {
        Regex::new(r"\{([a-z_]+)\}").expect("placeholder regex should compile")
    })
}

/// A named template with `{placeholder}` slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    name: String,
    text: String,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Distinct placeholder names in order of first appearance
    pub fn placeholders(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        placeholder_pattern()
            .captures_iter(&self.text)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .filter(|name| seen.insert(*name))
            .collect()
    }

    /// Substitute every placeholder. Extra values are ignored; a missing
    /// one is a configuration error naming the placeholder.
    pub fn render(&self, values: &BTreeMap<&str, String>) -> Result<String> {
        let missing: Vec<&str> = self
            .placeholders()
            .into_iter()
            .filter(|name| !values.contains_key(name))
            .collect();

        if !missing.is_empty() {
            return Err(TrailerError::Config(format!(
                "Prompt template '{}' is missing values for: {}",
                self.name,
                missing.join(", ")
            )));
        }

        let rendered = placeholder_pattern().replace_all(&self.text, |caps: &regex::Captures| {
            values
                .get(&caps[1])
                .cloned()
                .unwrap_or_default()
        });

        Ok(rendered.into_owned())
    }
}

/// The template set used by the orchestrator
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub title: PromptTemplate,
    pub script: PromptTemplate,
    pub title_system: String,
    pub script_system: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self::from_config(&PromptConfig::default())
    }
}

impl PromptTemplates {
    /// Built-in templates with any configured overrides applied
    pub fn from_config(config: &PromptConfig) -> Self {
        Self {
            title: PromptTemplate::new(
                "title",
                config.title_template.as_deref().unwrap_or(TITLE_TEMPLATE),
            ),
            script: PromptTemplate::new(
                "script",
                config.script_template.as_deref().unwrap_or(SCRIPT_TEMPLATE),
            ),
            title_system: config
                .title_system_prompt
                .clone()
                .unwrap_or_else(|| TITLE_SYSTEM_PROMPT.to_string()),
            script_system: config
                .script_system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}
