//! Anti-highlight: keep IRC clients from pinging users named in relayed text.

use crate::bus::TargetedMessage;
use crate::common::FilterError;
use crate::filter::{boxed, value_text, Filter};
use crate::loadable::{DescriptorBuilder, Loadable, TypeDescriptor};

/// Type tag under which the filter is registered.
pub const ANTI_HIGHLIGHT_TYPE: &str = "antihighlight";

/// Inserts `splitter` between the characters of a data value and rewrites
/// every occurrence of the original value in the text.
#[derive(Debug, Default)]
pub struct AntiHighlight {
    splitter: String,
    variable: String,
}

impl AntiHighlight {
    pub fn descriptor() -> TypeDescriptor<Box<dyn Filter>> {
        DescriptorBuilder::new(|_| Ok(AntiHighlight::default()))
            .required("splitter", |filter: &mut AntiHighlight, v: String| filter.splitter = v)
            .required("variable", |filter: &mut AntiHighlight, v: String| filter.variable = v)
            .finish(boxed)
    }
}

impl Loadable for AntiHighlight {}

impl Filter for AntiHighlight {
    fn name(&self) -> &'static str {
        ANTI_HIGHLIGHT_TYPE
    }

    fn process(&self, message: &mut TargetedMessage) -> Result<(), FilterError> {
        let Some(old_value) = message.data().get(&self.variable).map(value_text) else {
            return Ok(());
        };
        if old_value.chars().count() <= 1 {
            return Ok(());
        }

        let new_value = split_characters(&old_value, &self.splitter);
        let text = message.text().replace(&old_value, &new_value);
        message.set_text(text);
        message.data_mut().insert(self.variable.clone(), new_value);
        Ok(())
    }
}

fn split_characters(value: &str, splitter: &str) -> String {
    let mut chars = value.chars();
    let mut out = String::with_capacity(value.len() * (splitter.len() + 1));
    if let Some(first) = chars.next() {
        out.push(first);
    }
    for c in chars {
        out.push_str(splitter);
        out.push(c);
    }
    out
}
