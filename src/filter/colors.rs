//! Color translation between IRC control codes and legacy `§` codes.
//!
//! Messages headed to an IRC endpoint get legacy codes rewritten as IRC
//! colors; messages headed anywhere else get IRC colors rewritten as legacy
//! codes, with bold, underline and reverse stripped.

use fancy_regex::{Captures, Regex};

use crate::bus::TargetedMessage;
use crate::common::{FilterError, LoadError};
use crate::endpoint::{EndpointKind, MESSAGE_TEXT, SENDER_NAME};
use crate::filter::{boxed, Filter};
use crate::loadable::{DescriptorBuilder, Loadable, TypeDescriptor};

/// Type tag under which the filter is registered.
pub const COLOR_FILTER_TYPE: &str = "color";

/// Prefix of a legacy color code.
pub const LEGACY_PREFIX: char = '\u{00A7}';

pub const IRC_COLOR: char = '\u{0003}';
pub const IRC_RESET: char = '\u{000F}';
pub const IRC_BOLD: char = '\u{0002}';
pub const IRC_UNDERLINE: char = '\u{001F}';
pub const IRC_REVERSE: char = '\u{0016}';

/// Legacy code character and the IRC color number it corresponds to.
const COLOR_MAP: [(char, u8); 16] = [
    ('0', 1),  // black
    ('1', 2),  // dark blue
    ('2', 3),  // dark green
    ('3', 10), // teal
    ('4', 5),  // brown
    ('5', 6),  // purple
    ('6', 7),  // olive
    ('7', 15), // light gray
    ('8', 14), // dark gray
    ('9', 12), // blue
    ('a', 9),  // green
    ('b', 11), // cyan
    ('c', 4),  // red
    ('d', 13), // magenta
    ('e', 8),  // yellow
    ('f', 0),  // white
];

fn legacy_to_irc_number(code: char) -> Option<u8> {
    let code = code.to_ascii_lowercase();
    COLOR_MAP
        .iter()
        .find(|(legacy, _)| *legacy == code)
        .map(|(_, irc)| *irc)
}

fn irc_number_to_legacy(number: u8) -> Option<char> {
    COLOR_MAP
        .iter()
        .find(|(_, irc)| *irc == number)
        .map(|(legacy, _)| *legacy)
}

/// Compiled patterns for both translation directions.
#[derive(Debug)]
pub struct ColorTranslator {
    legacy_code: Regex,
    irc_color: Regex,
    irc_formatting: Regex,
}

impl ColorTranslator {
    pub fn new() -> Result<Self, LoadError> {
        Ok(Self {
            legacy_code: compile(&format!("(?i){}([a-z0-9])", LEGACY_PREFIX))?,
            irc_color: compile(&format!("{}([0-9]{{1,2}})(?:,[0-9]{{1,2}})?", IRC_COLOR))?,
            irc_formatting: compile(&format!("[{}{}{}]", IRC_BOLD, IRC_UNDERLINE, IRC_REVERSE))?,
        })
    }

    /// Rewrite legacy codes as IRC colors. Unknown codes are left in place.
    pub fn to_irc(&self, text: &str) -> String {
        let mut translated = self
            .legacy_code
            .replace_all(text, |caps: &Captures| -> String {
                let code = caps[1].chars().next().unwrap_or_default();
                match legacy_to_irc_number(code) {
                    Some(number) => format!("{}{:02}", IRC_COLOR, number),
                    None if code.eq_ignore_ascii_case(&'r') => IRC_RESET.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned();
        translated.push(IRC_RESET);
        translated
    }

    /// Rewrite IRC colors as legacy codes. Unknown color numbers are left in place.
    pub fn to_legacy(&self, text: &str) -> String {
        let stripped = self.irc_formatting.replace_all(text, "");
        let reset = stripped.replace(IRC_RESET, &format!("{}r", LEGACY_PREFIX));
        let mut translated = self
            .irc_color
            .replace_all(&reset, |caps: &Captures| -> String {
                caps[1]
                    .parse::<u8>()
                    .ok()
                    .and_then(irc_number_to_legacy)
                    .map(|code| format!("{}{}", LEGACY_PREFIX, code))
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
        translated.push(LEGACY_PREFIX);
        translated.push('r');
        translated
    }

    /// Translate for delivery to an endpoint of `kind`.
    pub fn translate(&self, kind: EndpointKind, text: &str) -> String {
        match kind {
            EndpointKind::Irc => self.to_irc(text),
            EndpointKind::Game => self.to_legacy(text),
        }
    }
}

/// Filter applying [`ColorTranslator`] to the text and well-known data fields.
#[derive(Debug)]
pub struct ColorFilter {
    translator: ColorTranslator,
}

impl ColorFilter {
    pub fn new() -> Result<Self, LoadError> {
        Ok(Self {
            translator: ColorTranslator::new()?,
        })
    }

    pub fn descriptor() -> TypeDescriptor<Box<dyn Filter>> {
        DescriptorBuilder::new(|_| ColorFilter::new()).finish(boxed)
    }
}

impl Loadable for ColorFilter {}

impl Filter for ColorFilter {
    fn name(&self) -> &'static str {
        COLOR_FILTER_TYPE
    }

    fn process(&self, message: &mut TargetedMessage) -> Result<(), FilterError> {
        let kind = message.target().kind();

        let text = self.translator.translate(kind, message.text());
        message.set_text(text);

        for key in [SENDER_NAME, MESSAGE_TEXT] {
            if let Some(value) = message.data().get_str(key) {
                let translated = self.translator.translate(kind, value);
                message.data_mut().insert(key, translated);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::Message;
    use crate::endpoint::testing::{irc_endpoint, null_endpoint};
    use std::sync::Arc;

    fn translator() -> ColorTranslator {
        ColorTranslator::new().unwrap()
    }

    fn strip_legacy(text: &str) -> String {
        let mut out = String::new();
        let mut chars = text.chars();
        while let Some(c) = chars.next() {
            if c == LEGACY_PREFIX {
                chars.next();
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_legacy_to_irc() {
        assert_eq!(translator().to_irc("§cRed §lbold"), "\u{3}04Red §lbold\u{f}");
        assert_eq!(translator().to_irc("§Aup§rdone"), "\u{3}09up\u{f}done\u{f}");
    }

    #[test]
    fn test_irc_to_legacy() {
        let t = translator();
        assert_eq!(t.to_legacy("\u{3}4red\u{f} plain"), "§cred§r plain§r");
        assert_eq!(t.to_legacy("\u{2}bold\u{2} \u{1f}u\u{1f}"), "bold u§r");
        assert_eq!(t.to_legacy("\u{3}12,01blue on black"), "§9blue on black§r");
        assert_eq!(t.to_legacy("\u{3}99odd"), "\u{3}99odd§r");
    }

    #[test]
    fn test_round_trip_keeps_color_and_text_for_all_colors() {
        let t = translator();
        for (code, _) in COLOR_MAP {
            let original = format!("{}{}text", LEGACY_PREFIX, code);
            let round_trip = t.to_legacy(&t.to_irc(&original));
            assert!(
                round_trip.starts_with(&original),
                "{:?} became {:?}",
                original,
                round_trip
            );
            assert_eq!(strip_legacy(&round_trip), "text");
        }
    }

    #[test]
    fn test_filter_direction_follows_target_kind() {
        let filter = ColorFilter::new().unwrap();

        let origin = Arc::new(
            Message::new("game", "§aHi")
                .with_field(SENDER_NAME, "§bBob")
                .with_field(MESSAGE_TEXT, "§aHi")
                .with_field("other", "§aleft alone"),
        );
        let mut to_irc = TargetedMessage::new(origin.clone(), irc_endpoint("irc"));
        filter.process(&mut to_irc).unwrap();

        assert_eq!(to_irc.text(), "\u{3}09Hi\u{f}");
        assert_eq!(to_irc.data().get_str(SENDER_NAME), Some("\u{3}11Bob\u{f}"));
        assert_eq!(to_irc.data().get_str(MESSAGE_TEXT), Some("\u{3}09Hi\u{f}"));
        assert_eq!(to_irc.data().get_str("other"), Some("§aleft alone"));

        let origin = Arc::new(Message::new("irc", "\u{3}4alert"));
        let mut to_game = TargetedMessage::new(origin, null_endpoint("game"));
        filter.process(&mut to_game).unwrap();
        assert_eq!(to_game.text(), "§calert§r");
    }

    #[test]
    fn test_non_text_fields_are_skipped() {
        let filter = ColorFilter::new().unwrap();
        let origin = Arc::new(Message::new("game", "").with_field(SENDER_NAME, 7));
        let mut message = TargetedMessage::new(origin, irc_endpoint("irc"));
        filter.process(&mut message).unwrap();
        assert!(message.data().overlay().get(SENDER_NAME).is_none());
    }
}
