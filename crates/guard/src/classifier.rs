//! The rule-table classifier.
//!
//! An ordered list of {category, patterns, reply}. Evaluation
//! lowercases the message once and walks the rules in priority order;
//! the first match wins. No match is a valid outcome, not an error —
//! `classify` is a pure, total function over any text input.

use lustre_config::GuardConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::vocabulary;

/// Rule categories in fixed priority order.
///
/// Greetings get their own category rather than falling into the
/// off-topic bucket: a plain "hello" deserves a welcome, not a
/// redirect. Injection phrases are checked last so a beauty question
/// that happens to contain "act as" still gets its topical rule first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleCategory {
    OffTopic,
    Competitor,
    Medical,
    Greeting,
    PromptInjection,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::OffTopic => "off_topic",
            RuleCategory::Competitor => "competitor",
            RuleCategory::Medical => "medical",
            RuleCategory::Greeting => "greeting",
            RuleCategory::PromptInjection => "prompt_injection",
        }
    }

    fn from_config_name(name: &str) -> Option<Self> {
        match name {
            "off_topic" => Some(RuleCategory::OffTopic),
            "competitor" => Some(RuleCategory::Competitor),
            "medical" => Some(RuleCategory::Medical),
            "greeting" => Some(RuleCategory::Greeting),
            "prompt_injection" => Some(RuleCategory::PromptInjection),
            _ => None,
        }
    }
}

/// How a rule's patterns are matched against the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Case-insensitive substring anywhere in the message
    Contains,
    /// The entire message (trimmed, outer punctuation stripped) must
    /// equal a pattern. Used for greetings so "hello!" matches but
    /// "hello, what's the weather in Paris" does not.
    WholeMessage,
}

/// One classification rule: vocabulary plus its canned reply.
#[derive(Debug, Clone)]
pub struct Rule {
    pub category: RuleCategory,
    pub matching: MatchMode,
    /// Patterns, stored lowercase
    pub patterns: Vec<String>,
    pub reply: String,
}

/// Classifier verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Answer locally with this canned reply; no model call
    Canned {
        category: RuleCategory,
        reply: String,
    },
    /// Forward to the model normally
    PassThrough,
}

/// The ordered rule table.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Build a table from explicit rules. Rules are evaluated in the
    /// order given.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The built-in vocabulary with config overrides applied.
    ///
    /// Overrides replace a category's pattern list and/or reply; the
    /// category priority order never changes.
    pub fn from_config(config: &GuardConfig) -> Self {
        let mut table = vocabulary::builtin_rules(&config.brand);

        for override_cfg in &config.rules {
            let Some(category) = RuleCategory::from_config_name(&override_cfg.category) else {
                // Unknown categories are rejected at config validation;
                // tolerate them here rather than panic.
                continue;
            };
            if let Some(rule) = table.iter_mut().find(|r| r.category == category) {
                if !override_cfg.patterns.is_empty() {
                    rule.patterns = override_cfg
                        .patterns
                        .iter()
                        .map(|p| p.to_lowercase())
                        .collect();
                }
                if let Some(reply) = &override_cfg.reply {
                    rule.reply = reply.clone();
                }
            }
        }

        Self::new(table)
    }

    /// Classify a message. First matching rule wins; no match means
    /// pass-through.
    pub fn classify(&self, message: &str) -> Verdict {
        let normalized = message.to_lowercase();
        let whole = normalized
            .trim()
            .trim_matches(|c: char| !c.is_alphanumeric())
            .trim();

        for rule in &self.rules {
            let hit = match rule.matching {
                MatchMode::Contains => {
                    rule.patterns.iter().any(|p| normalized.contains(p.as_str()))
                }
                MatchMode::WholeMessage => rule.patterns.iter().any(|p| whole == p.as_str()),
            };

            if hit {
                debug!(category = rule.category.as_str(), "message matched guard rule");
                return Verdict::Canned {
                    category: rule.category,
                    reply: rule.reply.clone(),
                };
            }
        }

        Verdict::PassThrough
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::from_config(&GuardConfig::default())
    }
}
