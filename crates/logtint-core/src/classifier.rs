use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use logtint_types::Severity;

/// Tokens marking a passed step
const SUCCESS_TOKENS: [&str; 2] = ["[SUCCEEDED]", "SUCCESS"];

/// Tokens marking a failed step
const FAILURE_TOKENS: [&str; 2] = ["[FAILED]", "FAILURE"];

/// Failed steps mentioning any of these are setup, cleanup or evaluation
/// checks rather than assertion failures
const PRECONDITION_MARKERS: [&str; 11] = [
    "IS THE BROWSER OPEN?",
    "OPERATION\"",
    "CLEANUP",
    "SETUP",
    "EVALUATION",
    "CHECK IF",
    "VERIFY IF",
    "WINDOWS FOUND",
    "TBOX EVALUATION TOOL",
    "EXPRESSION\"",
    "EVALUATED TO",
];

const ERROR_TOKENS: [&str; 2] = ["[ERR]", "ERROR"];
const WARNING_TOKENS: [&str; 2] = ["[WRN]", "WARNING"];
const INFO_TOKENS: [&str; 2] = ["[INF]", "INFO"];

static BUILTIN: LazyLock<Classifier> = LazyLock::new(Classifier::builtin);

/// Classify a line with the built-in rule table
pub fn classify(line: &str) -> Severity {
    BUILTIN.classify(line)
}

/// Downgrade applied when a matched line also carries one of the markers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demotion {
    pub markers: Vec<String>,
    pub severity: Severity,
}

/// One entry of the ordered rule table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Substrings that select this rule (any of them)
    pub tokens: Vec<String>,

    /// Severity assigned when the rule matches
    pub severity: Severity,

    /// Optional downgrade evaluated only after the rule matched
    #[serde(default)]
    pub demotion: Option<Demotion>,
}

impl Rule {
    pub fn new(tokens: &[&str], severity: Severity) -> Self {
        Self {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            severity,
            demotion: None,
        }
    }

    pub fn with_demotion(mut self, markers: &[&str], severity: Severity) -> Self {
        self.demotion = Some(Demotion {
            markers: markers.iter().map(|m| m.to_string()).collect(),
            severity,
        });
        self
    }

    /// Evaluate against an already uppercased line
    fn evaluate(&self, upper: &str) -> Option<Severity> {
        if !self.tokens.iter().any(|t| upper.contains(t.as_str())) {
            return None;
        }

        match &self.demotion {
            Some(demotion) if demotion.markers.iter().any(|m| upper.contains(m.as_str())) => {
                Some(demotion.severity)
            }
            _ => Some(self.severity),
        }
    }

    fn normalized(mut self) -> Self {
        self.tokens = self.tokens.iter().map(|t| t.to_uppercase()).collect();
        if let Some(demotion) = &mut self.demotion {
            demotion.markers = demotion.markers.iter().map(|m| m.to_uppercase()).collect();
        }
        self
    }
}

/// Ordered, first-match-wins severity classifier
#[derive(Clone, Debug)]
pub struct Classifier {
    rules: Vec<Rule>,
    fallback: Severity,
}

impl Classifier {
    /// Build a classifier from a rule table; matching is case-insensitive
    pub fn new(rules: Vec<Rule>, fallback: Severity) -> Self {
        Self {
            rules: rules.into_iter().map(Rule::normalized).collect(),
            fallback,
        }
    }

    /// The built-in rule table
    pub fn builtin() -> Self {
        Self::new(builtin_rules(), Severity::Info)
    }

    /// Classify a single line
    pub fn classify(&self, line: &str) -> Severity {
        let upper = line.to_uppercase();

        self.rules
            .iter()
            .find_map(|rule| rule.evaluate(&upper))
            .unwrap_or(self.fallback)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn fallback(&self) -> Severity {
        self.fallback
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Rule table in evaluation order; success is checked before failure
pub fn builtin_rules() -> Vec<Rule> {
    vec![
        Rule::new(&SUCCESS_TOKENS, Severity::Succeeded),
        Rule::new(&FAILURE_TOKENS, Severity::Failed)
            .with_demotion(&PRECONDITION_MARKERS, Severity::Warning),
        Rule::new(&ERROR_TOKENS, Severity::Error),
        Rule::new(&WARNING_TOKENS, Severity::Warning),
        Rule::new(&INFO_TOKENS, Severity::Info),
    ]
}
