//! Line classification for paragraph reflow.
//!
//! Rules are evaluated top to bottom and the first match wins. A line no rule
//! matches continues the paragraph being accumulated.

/// How a transcription line is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Short upper-case line, rendered in a heading style.
    TitleHeading,
    /// Label-like line, rendered as its own bold paragraph.
    LabelHeading,
    /// Starts a new paragraph, e.g. `1. Scope` or `2) Terms`.
    NumberedItem,
    Continuation,
}

struct Rule {
    name: &'static str,
    kind: LineKind,
    matches: fn(&str, &[String]) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        name: "upper_case_heading",
        kind: LineKind::TitleHeading,
        matches: is_upper_case_heading,
    },
    Rule {
        name: "colon_label",
        kind: LineKind::LabelHeading,
        matches: is_colon_label,
    },
    Rule {
        name: "label_prefix",
        kind: LineKind::LabelHeading,
        matches: has_label_prefix,
    },
    Rule {
        name: "numbered_item",
        kind: LineKind::NumberedItem,
        matches: is_numbered_item,
    },
];

/// Upper-case in the sense of "has cased letters and none of them lower".
pub fn is_upper_case(line: &str) -> bool {
    let mut cased = false;
    for c in line.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

fn is_upper_case_heading(line: &str, _: &[String]) -> bool {
    line.chars().count() < 80 && is_upper_case(line)
}

fn is_colon_label(line: &str, _: &[String]) -> bool {
    line.chars().count() < 50 && line.ends_with(':')
}

fn has_label_prefix(line: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| line.starts_with(prefix.as_str()))
}

fn is_numbered_item(line: &str, _: &[String]) -> bool {
    let mut chars = line.chars();
    let (Some(first), Some(second)) = (chars.next(), chars.next()) else {
        return false;
    };
    line.chars().count() > 2 && first.is_ascii_digit() && matches!(second, '.' | ')')
}

/// Classifies trimmed, non-blank transcription lines.
#[derive(Debug, Clone, Copy)]
pub struct LineClassifier<'a> {
    label_prefixes: &'a [String],
}

impl<'a> LineClassifier<'a> {
    pub fn new(label_prefixes: &'a [String]) -> Self {
        Self { label_prefixes }
    }

    pub fn classify(&self, line: &str) -> LineKind {
        self.matching_rule(line)
            .map(|(_, kind)| kind)
            .unwrap_or(LineKind::Continuation)
    }

    /// Name and kind of the first rule matching `line`.
    pub fn matching_rule(&self, line: &str) -> Option<(&'static str, LineKind)> {
        RULES
            .iter()
            .find(|rule| (rule.matches)(line, self.label_prefixes))
            .map(|rule| (rule.name, rule.kind))
    }
}

/// Rule names in evaluation order.
pub fn rule_names() -> impl Iterator<Item = &'static str> {
    RULES.iter().map(|rule| rule.name)
}
