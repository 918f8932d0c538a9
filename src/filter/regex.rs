//! Regex filter: allow, drop, replace or store based on a pattern.
//!
//! ```yaml
//! - type: regex
//!   value: MESSAGE_TEXT     # data key to inspect
//!   pattern: '(?<user>\w+): (?<msg>.+)'
//!   action: store           # allow | drop | replace | store
//!   match: partial          # full | partial
//!   replacement: '$1'       # replace only
//! ```

use fancy_regex::Regex;
use serde_json::Value;

use crate::bus::TargetedMessage;
use crate::common::{FilterError, LoadError};
use crate::endpoint::MESSAGE_TEXT;
use crate::filter::{boxed, value_text, Filter};
use crate::loadable::{ConfigNode, DescriptorBuilder, Loadable, TypeDescriptor};

/// Type tag under which the filter is registered.
pub const REGEX_FILTER_TYPE: &str = "regex";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexAction {
    /// Reject unless the pattern matches.
    Allow,
    /// Reject when the pattern matches.
    Drop,
    /// Rewrite the inspected value.
    Replace,
    /// Copy named groups into the message data.
    Store,
}

impl RegexAction {
    const NAMES: &'static str = "ALLOW, DROP, REPLACE, STORE";

    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "ALLOW" => Some(RegexAction::Allow),
            "DROP" => Some(RegexAction::Drop),
            "REPLACE" => Some(RegexAction::Replace),
            "STORE" => Some(RegexAction::Store),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// The whole value must match.
    Full,
    /// Any substring may match.
    #[default]
    Partial,
}

impl MatchMode {
    fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "FULL" => Some(MatchMode::Full),
            "PARTIAL" => Some(MatchMode::Partial),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Rule {
    pattern: Regex,
    /// Whole-value variant, present only in full mode.
    anchored: Option<Regex>,
    action: RegexAction,
    mode: MatchMode,
    replacement: String,
    groups: Vec<String>,
}

impl Rule {
    fn matches(&self, value: &str) -> Result<bool, FilterError> {
        self.anchored
            .as_ref()
            .unwrap_or(&self.pattern)
            .is_match(value)
            .map_err(regex_error)
    }

    /// Named groups captured from `value`: every match in partial mode, the
    /// single whole-value match in full mode. Later matches win.
    fn captures(&self, value: &str) -> Result<Vec<(String, String)>, FilterError> {
        let mut stored = Vec::new();
        let mut collect = |caps: &fancy_regex::Captures| {
            for group in &self.groups {
                if let Some(found) = caps.name(group) {
                    stored.push((group.clone(), found.as_str().to_string()));
                }
            }
        };

        match &self.anchored {
            Some(anchored) => {
                if let Some(caps) = anchored.captures(value).map_err(regex_error)? {
                    collect(&caps);
                }
            }
            None => {
                for caps in self.pattern.captures_iter(value) {
                    collect(&caps.map_err(regex_error)?);
                }
            }
        }
        Ok(stored)
    }
}

/// Filter driven by a single regular expression.
#[derive(Debug)]
pub struct RegexFilter {
    /// Data key whose value is inspected.
    value: String,
    rule: Option<Rule>,
}

impl Default for RegexFilter {
    fn default() -> Self {
        Self {
            value: MESSAGE_TEXT.to_string(),
            rule: None,
        }
    }
}

impl RegexFilter {
    pub fn descriptor() -> TypeDescriptor<Box<dyn Filter>> {
        DescriptorBuilder::new(|_| Ok(RegexFilter::default()))
            .field("value", |filter: &mut RegexFilter, key: String| filter.value = key)
            .finish(boxed)
    }

    pub fn action(&self) -> Option<RegexAction> {
        self.rule.as_ref().map(|rule| rule.action)
    }

    pub fn match_mode(&self) -> Option<MatchMode> {
        self.rule.as_ref().map(|rule| rule.mode)
    }
}

impl Loadable for RegexFilter {
    fn load(&mut self, entry: &ConfigNode) -> Result<(), LoadError> {
        let pattern = entry
            .get("pattern")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid("pattern", "Regex pattern requires a 'pattern' defined"))?;

        let action = entry
            .get("action")
            .and_then(Value::as_str)
            .and_then(RegexAction::parse)
            .ok_or_else(|| {
                invalid(
                    "action",
                    &format!(
                        "Regex pattern requires an 'action' defined. Valid action types: {}",
                        RegexAction::NAMES
                    ),
                )
            })?;

        let mode = match entry.get("match").and_then(Value::as_str) {
            Some(name) => MatchMode::parse(name)
                .ok_or_else(|| invalid("match", "Valid match types: FULL, PARTIAL"))?,
            None => MatchMode::default(),
        };

        let compiled = compile(pattern)?;
        let anchored = match mode {
            MatchMode::Full => Some(anchor(pattern)?),
            MatchMode::Partial => None,
        };
        let groups: Vec<String> = compiled
            .capture_names()
            .flatten()
            .map(str::to_string)
            .collect();

        let mut replacement = String::new();
        match action {
            RegexAction::Replace => {
                replacement = entry
                    .get("replacement")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        invalid(
                            "replacement",
                            "Regex pattern replace action requires 'replacement' to be set",
                        )
                    })?
                    .to_string();
            }
            RegexAction::Store if groups.is_empty() => {
                return Err(invalid(
                    "pattern",
                    "To use the STORE action, a named matching group must be defined",
                ));
            }
            _ => {}
        }

        self.rule = Some(Rule {
            pattern: compiled,
            anchored,
            action,
            mode,
            replacement,
            groups,
        });
        Ok(())
    }
}

impl Filter for RegexFilter {
    fn name(&self) -> &'static str {
        REGEX_FILTER_TYPE
    }

    fn process(&self, message: &mut TargetedMessage) -> Result<(), FilterError> {
        let rule = self.rule.as_ref().ok_or(FilterError::Unloaded {
            filter: REGEX_FILTER_TYPE,
        })?;
        let value = message
            .data()
            .get(&self.value)
            .map(value_text)
            .ok_or_else(|| FilterError::MissingValue {
                key: self.value.clone(),
            })?;

        match rule.action {
            RegexAction::Allow => {
                if !rule.matches(&value)? {
                    message.reject();
                }
            }
            RegexAction::Drop => {
                if rule.matches(&value)? {
                    message.reject();
                }
            }
            RegexAction::Replace => {
                if rule.matches(&value)? {
                    let replaced = rule
                        .pattern
                        .replace_all(&value, rule.replacement.as_str())
                        .into_owned();
                    message.data_mut().insert(self.value.clone(), replaced);
                }
            }
            RegexAction::Store => {
                for (group, found) in rule.captures(&value)? {
                    message.data_mut().insert(group, found);
                }
            }
        }
        Ok(())
    }
}

fn compile(pattern: &str) -> Result<Regex, LoadError> {
    Regex::new(pattern).map_err(|e| LoadError::InvalidPattern {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// Compile `pattern` so that it must span the whole value.
///
/// An extended-mode pattern ending in a `#` comment would swallow the closing
/// group, so that case is retried with the group closed on a new line.
fn anchor(pattern: &str) -> Result<Regex, LoadError> {
    compile(&format!("^(?:{})$", pattern))
        .or_else(|_| compile(&format!("^(?:{}\n)$", pattern)))
}

fn invalid(field: &str, message: &str) -> LoadError {
    LoadError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn regex_error(e: fancy_regex::Error) -> FilterError {
    FilterError::Regex {
        message: e.to_string(),
    }
}
