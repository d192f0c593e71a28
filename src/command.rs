//! Command grammar for inbound text messages.
//!
//! Commands are written as a keyword followed by a colon, optionally carrying a
//! coordinate pair:
//!
//! ```text
//! Distance: 51.5007, -0.1246
//! Signal:
//! Time:
//! ```
//!
//! Matching is line-anchored: any line of the message may carry the command, and
//! the coordinate form is always tried before the bare form. Text that matches
//! neither yields the `"none"` sentinel keyword; extraction never fails.
//!
//! The first number of the coordinate form is the latitude and the second is the
//! longitude, the same order map applications use when copying a position.
use crate::geo::Coordinates;
use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;

/// Keyword reported when the text contains no command.
pub const NO_COMMAND: &str = "none";

const NUMBER: &str = r"[-+]?(?:[0-9]+(?:\.[0-9]+)?|\.[0-9]+)";

static COORDINATE_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?m)^(\w+):[ \t]*({NUMBER}),[ \t]*({NUMBER})"))
        .expect("coordinate command pattern")
});

static BARE_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\w+):$").expect("bare command pattern"));

/// A command extracted from one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub keyword: String,
    pub coordinates: Option<Coordinates>,
}

/// The behaviours the responder knows about, derived from [`Command::keyword`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Distance,
    Signal,
    Time,
    /// Unrecognised keyword or the no-match sentinel; answered with an echo.
    Echo,
}

impl Command {
    pub fn none() -> Self {
        Self {
            keyword: NO_COMMAND.to_string(),
            coordinates: None,
        }
    }

    pub fn is_none(&self) -> bool {
        self.keyword == NO_COMMAND && self.coordinates.is_none()
    }

    /// Keywords are case-sensitive: `time:` is echoed, `Time:` is answered.
    pub fn kind(&self) -> CommandKind {
        match self.keyword.as_str() {
            "Distance" => CommandKind::Distance,
            "Signal" => CommandKind::Signal,
            "Time" => CommandKind::Time,
            _ => CommandKind::Echo,
        }
    }
}

/// Extract the first command found in `text`.
pub fn extract(text: &str) -> Command {
    if let Some(cmd) = extract_with_coordinates(text) {
        trace!("Parsed coordinate command {:?}", cmd);
        return cmd;
    }
    if let Some(caps) = BARE_FORM.captures(text) {
        trace!("Parsed bare command '{}'", &caps[1]);
        return Command {
            keyword: caps[1].to_string(),
            coordinates: None,
        };
    }
    Command::none()
}

fn extract_with_coordinates(text: &str) -> Option<Command> {
    let caps = COORDINATE_FORM.captures(text)?;
    let latitude = caps[2].parse::<f64>().ok()?;
    let longitude = caps[3].parse::<f64>().ok()?;
    Some(Command {
        keyword: caps[1].to_string(),
        coordinates: Some(Coordinates {
            latitude,
            longitude,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_form_captures_both_numbers() {
        let cmd = extract("CMD: 12.5, -45.25");
        assert_eq!(cmd.keyword, "CMD");
        let c = cmd.coordinates.expect("coordinates");
        assert_eq!(c.latitude, 12.5);
        assert_eq!(c.longitude, -45.25);
    }

    #[test]
    fn spaces_after_separators_are_optional() {
        let cmd = extract("Distance:1,2");
        assert_eq!(cmd.keyword, "Distance");
        assert_eq!(
            cmd.coordinates,
            Some(Coordinates {
                latitude: 1.0,
                longitude: 2.0
            })
        );
    }

    #[test]
    fn signed_integers_and_leading_dot_parse() {
        let cmd = extract("Distance: -33, +.5");
        let c = cmd.coordinates.unwrap();
        assert_eq!(c.latitude, -33.0);
        assert_eq!(c.longitude, 0.5);
    }

    #[test]
    fn bare_form_has_no_coordinates() {
        let cmd = extract("Time:");
        assert_eq!(cmd.keyword, "Time");
        assert!(cmd.coordinates.is_none());
        assert_eq!(cmd.kind(), CommandKind::Time);
    }

    #[test]
    fn bare_form_rejects_trailing_text() {
        assert!(extract("Time: now").is_none());
        assert!(extract(" Time:").is_none());
    }

    #[test]
    fn empty_and_plain_text_yield_sentinel() {
        assert_eq!(extract(""), Command::none());
        assert_eq!(extract("hello world"), Command::none());
        assert_eq!(extract("hello world").keyword, NO_COMMAND);
    }

    #[test]
    fn kind_is_case_sensitive() {
        assert_eq!(extract("signal:").kind(), CommandKind::Echo);
        assert_eq!(extract("Signal:").kind(), CommandKind::Signal);
    }
}
