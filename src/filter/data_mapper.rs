//! Data mapper: render the message text from a `%variable%` template.

use fancy_regex::Regex;

use crate::bus::TargetedMessage;
use crate::common::{FilterError, LoadError};
use crate::filter::{boxed, value_text, Filter};
use crate::loadable::{ConfigNode, DescriptorBuilder, Loadable, TypeDescriptor};

/// Type tag under which the filter is registered.
pub const DATA_MAPPER_TYPE: &str = "datamapper";

const PERCENT_VARIABLE: &str = r"%([^ %\n]+)%";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// Replaces the current text with a template filled from message data.
/// Variables without a value render as the empty string.
#[derive(Debug, Default)]
pub struct DataMapper {
    /// Template as written in the configuration.
    template: String,
    segments: Vec<Segment>,
}

impl DataMapper {
    pub fn descriptor() -> TypeDescriptor<Box<dyn Filter>> {
        DescriptorBuilder::new(|_| Ok(DataMapper::default()))
            .required("message", |mapper: &mut DataMapper, template: String| {
                mapper.template = template
            })
            .finish(boxed)
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Variable names referenced by the template, in order of appearance.
    pub fn variables(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Variable(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }
}

impl Loadable for DataMapper {
    fn load(&mut self, _entry: &ConfigNode) -> Result<(), LoadError> {
        self.segments = parse_template(&self.template)?;
        Ok(())
    }
}

impl Filter for DataMapper {
    fn name(&self) -> &'static str {
        DATA_MAPPER_TYPE
    }

    fn process(&self, message: &mut TargetedMessage) -> Result<(), FilterError> {
        let mut text = String::with_capacity(self.template.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => text.push_str(literal),
                Segment::Variable(name) => {
                    if let Some(value) = message.data().get(name) {
                        text.push_str(&value_text(value));
                    }
                }
            }
        }
        message.set_text(text);
        Ok(())
    }
}

fn parse_template(template: &str) -> Result<Vec<Segment>, LoadError> {
    let pattern = Regex::new(PERCENT_VARIABLE).map_err(|e| LoadError::InvalidPattern {
        pattern: PERCENT_VARIABLE.to_string(),
        message: e.to_string(),
    })?;

    let mut segments = Vec::new();
    let mut last = 0;
    for caps in pattern.captures_iter(template).flatten() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Literal(template[last..whole.start()].to_string()));
        }
        segments.push(Segment::Variable(name.as_str().to_string()));
        last = whole.end();
    }
    if last < template.len() {
        segments.push(Segment::Literal(template[last..].to_string()));
    }
    Ok(segments)
}
