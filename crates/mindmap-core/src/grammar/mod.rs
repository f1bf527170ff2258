//! CTM (Compact Tree Markup) grammar validation.
//!
//! CTM encodes one node per line. Leading `>` characters give the depth,
//! the rest of the line up to the first unescaped `|` is the label, and an
//! optional `|key:value,key2:value2` suffix carries attributes:
//!
//! ```text
//! Root
//! >Child|color:red
//! >>Grandchild
//! ```
//!
//! Validation runs a structural pass over every content line (markers,
//! label, level continuity) and then an attribute pass. The first violation
//! wins. Reported line numbers are physical lines of the fence-stripped
//! content, blank lines included.

pub mod fence;
pub(crate) mod scan;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::document::{CtmDocument, CtmNode};
use crate::domain::error::CtmError;

pub use fence::strip_fence;

use scan::{find_unescaped, split_unescaped, unescape};

const BLANK_LINE_WARNING: &str = "Warning: Blank lines detected between nodes (should be avoided).";

/// Result of [`validate`]: a verdict plus a human-readable diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub message: String,
}

impl ValidationOutcome {
    pub fn valid(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
        }
    }
}

/// A successfully parsed document plus any non-fatal findings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReport {
    pub document: CtmDocument,
    /// Blank lines were found between content lines.
    pub has_blank_lines: bool,
}

impl ParseReport {
    /// Summary line used as the success diagnostic.
    pub fn summary(&self) -> String {
        let mut message = format!("Valid CTM format with {} nodes.", self.document.len());
        if self.has_blank_lines {
            message.push(' ');
            message.push_str(BLANK_LINE_WARNING);
        }
        message
    }
}

/// Validate CTM text as produced by a generator.
///
/// Pure and deterministic. A surrounding code fence is ignored.
pub fn validate(text: &str) -> ValidationOutcome {
    match parse_with_report(text) {
        Ok(report) => ValidationOutcome::valid(report.summary()),
        Err(err) => ValidationOutcome::invalid(err.to_string()),
    }
}

/// Quick boolean form of [`validate`].
pub fn is_valid_ctm(text: &str) -> bool {
    parse_with_report(text).is_ok()
}

/// Parse CTM text into a typed document, applying every validation rule.
pub fn parse_document(text: &str) -> Result<CtmDocument, CtmError> {
    parse_with_report(text).map(|report| report.document)
}

/// A content line and its 1-based position in the stripped text.
struct ContentLine<'a> {
    number: usize,
    text: &'a str,
}

/// Structural facts about a line that passed the first pass.
struct Structured<'a> {
    level: usize,
    label: &'a str,
}

/// Run both validation passes and keep the parsed nodes.
pub fn parse_with_report(text: &str) -> Result<ParseReport, CtmError> {
    let content = strip_fence(text);
    if content.is_empty() {
        return Err(CtmError::EmptyInput);
    }

    let (lines, has_blank_lines) = content_lines(content);
    let Some(first) = lines.first() else {
        return Err(CtmError::EmptyInput);
    };

    let root_level = marker_count(first.text);
    if root_level != 0 {
        return Err(CtmError::RootNotLevelZero {
            line: first.number,
            found: root_level,
        });
    }

    let mut structured = Vec::with_capacity(lines.len());
    let mut prev_level = 0usize;
    for line in &lines {
        let node = check_structure(line, prev_level)?;
        prev_level = node.level;
        structured.push(node);
    }

    let mut nodes = Vec::with_capacity(lines.len());
    for (line, node) in lines.iter().zip(structured) {
        let attributes = parse_attributes(line)?;
        nodes.push(CtmNode {
            level: node.level,
            label: unescape(node.label),
            attributes,
        });
    }

    Ok(ParseReport {
        document: CtmDocument::new(nodes),
        has_blank_lines,
    })
}

/// Non-blank lines with their numbers, and whether a blank line sat between
/// two of them.
fn content_lines(content: &str) -> (Vec<ContentLine<'_>>, bool) {
    let mut lines = Vec::new();
    let mut has_blank_lines = false;
    let mut prev_was_content = false;

    for (idx, text) in content.split('\n').enumerate() {
        if text.trim().is_empty() {
            if prev_was_content {
                has_blank_lines = true;
            }
            continue;
        }
        lines.push(ContentLine {
            number: idx + 1,
            text,
        });
        prev_was_content = true;
    }

    (lines, has_blank_lines)
}

/// Number of leading `>` characters.
fn marker_count(line: &str) -> usize {
    line.chars().take_while(|&c| c == '>').count()
}

/// Structural checks for one line, in rule order.
fn check_structure<'a>(line: &ContentLine<'a>, prev_level: usize) -> Result<Structured<'a>, CtmError> {
    let number = line.number;
    check_marker_spacing(line)?;

    let level = marker_count(line.text);
    let body = &line.text[level..];

    let label_end = find_unescaped(body, '|').unwrap_or(body.len());
    let label = body[..label_end].trim();
    if label.is_empty() {
        return Err(CtmError::EmptyLabel { line: number });
    }

    if level > prev_level + 1 {
        return Err(CtmError::LevelSkip {
            line: number,
            previous: prev_level,
            current: level,
            missing: prev_level + 1,
        });
    }

    Ok(Structured { level, label })
}

/// The label must abut the markers, and markers must not contain gaps.
fn check_marker_spacing(line: &ContentLine<'_>) -> Result<(), CtmError> {
    let number = line.number;
    let text = line.text;

    if text.starts_with([' ', '\t']) {
        return Err(CtmError::LeadingWhitespace { line: number });
    }

    // The marker run is everything up to the last '>' reachable through
    // '>' and whitespace only, e.g. ">> >" in ">> >Label".
    let run_len = text
        .char_indices()
        .take_while(|(_, c)| matches!(c, '>' | ' ' | '\t'))
        .filter(|(_, c)| *c == '>')
        .last()
        .map(|(i, _)| i + 1)
        .unwrap_or(0);
    let run = &text[..run_len];
    if run.contains([' ', '\t']) {
        return Err(CtmError::WhitespaceInMarkers { line: number });
    }

    if run_len > 0 && text[run_len..].starts_with([' ', '\t']) {
        return Err(CtmError::WhitespaceAfterMarkers { line: number });
    }

    Ok(())
}

/// Attribute pass for one line. Lines without an unescaped `|` have none.
fn parse_attributes(line: &ContentLine<'_>) -> Result<BTreeMap<String, String>, CtmError> {
    let number = line.number;
    let body = line.text.trim_start_matches('>');
    let mut attributes = BTreeMap::new();

    let Some(pipe) = find_unescaped(body, '|') else {
        return Ok(attributes);
    };

    let block = &body[pipe + 1..];
    if block.trim().is_empty() {
        return Err(CtmError::EmptyAttributes { line: number });
    }

    for pair in split_unescaped(block, ',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        let Some(colon) = find_unescaped(pair, ':') else {
            return Err(CtmError::MalformedAttribute {
                line: number,
                pair: pair.to_string(),
            });
        };

        let key = pair[..colon].trim();
        if key.is_empty() {
            return Err(CtmError::EmptyAttributeKey {
                line: number,
                pair: pair.to_string(),
            });
        }

        let value = pair[colon + 1..].trim();
        attributes.insert(unescape(key), unescape(value));
    }

    Ok(attributes)
}
