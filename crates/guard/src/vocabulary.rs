//! Built-in matching vocabulary and canned replies.
//!
//! This is configuration data expressed as code defaults: every
//! pattern list and reply can be replaced per-category from
//! `GuardConfig` without touching control flow.

use crate::classifier::{MatchMode, Rule, RuleCategory};

/// The built-in rule set, in priority order, with replies templated
/// over the configured brand name.
pub fn builtin_rules(brand: &str) -> Vec<Rule> {
    vec![
        Rule {
            category: RuleCategory::OffTopic,
            matching: MatchMode::Contains,
            patterns: to_lowercase(&[
                "weather",
                "politics",
                "political",
                "election",
                "stock market",
                "stocks",
                "crypto",
                "bitcoin",
                "sports",
                "football",
                "basketball",
                "homework",
                "math problem",
                "recipe",
                "cooking",
                "movie",
                "lottery",
                "video game",
            ]),
            reply: format!(
                "I'm here to help with {brand} products and all things beauty! Ask me \
                 about skincare, makeup, haircare, or fragrance and I'll happily point \
                 you in the right direction."
            ),
        },
        Rule {
            category: RuleCategory::Competitor,
            matching: MatchMode::Contains,
            patterns: to_lowercase(&[
                "maybelline",
                "estee lauder",
                "estée lauder",
                "clinique",
                "mac cosmetics",
                "dior",
                "chanel",
                "fenty",
                "nyx",
                "revlon",
                "urban decay",
                "glossier",
                "elf cosmetics",
                "e.l.f.",
            ]),
            reply: format!(
                "I can only speak for {brand}! Tell me what you're looking for — \
                 mascara, foundation, skincare — and I'll recommend a {brand} product \
                 you'll love."
            ),
        },
        Rule {
            category: RuleCategory::Medical,
            matching: MatchMode::Contains,
            patterns: to_lowercase(&[
                "diagnose",
                "diagnosis",
                "prescription",
                "prescribe",
                "medication",
                "antibiotic",
                "steroid",
                "cure my",
                "treat my",
                "eczema",
                "psoriasis",
                "rosacea",
                "dermatitis",
                "infection",
                "rash",
                "allergic reaction",
            ]),
            reply: format!(
                "I can't give medical advice. For skin or health concerns, please see a \
                 dermatologist or another qualified professional. I'm always happy to \
                 help with {brand} products and everyday beauty routines!"
            ),
        },
        Rule {
            category: RuleCategory::Greeting,
            matching: MatchMode::WholeMessage,
            patterns: to_lowercase(&[
                "hi",
                "hello",
                "hey",
                "hiya",
                "yo",
                "hi there",
                "hey there",
                "good morning",
                "good afternoon",
                "good evening",
            ]),
            reply: format!("👋 Hello! I'm the {brand} beauty assistant. How can I help you today?"),
        },
        Rule {
            category: RuleCategory::PromptInjection,
            matching: MatchMode::Contains,
            patterns: to_lowercase(&[
                "ignore previous instructions",
                "ignore all previous",
                "ignore your instructions",
                "disregard previous",
                "disregard your",
                "act as",
                "you are now",
                "pretend to be",
                "pretend you are",
                "system prompt",
                "developer mode",
                "jailbreak",
                "reveal your prompt",
            ]),
            reply: format!(
                "I'm the {brand} beauty assistant, and that's who I'll stay! What \
                 beauty question can I help you with?"
            ),
        },
    ]
}

fn to_lowercase(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_lowercase()).collect()
}
