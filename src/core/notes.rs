//! Fragrance notes: parsing the free-text sheet column into ordered groups.
//!
//! Sheets write notes either as a plain comma list (`"Bergamot, Lemon"`) or
//! as labelled segments (`"Top: Bergamot, Lemon; Heart: Lavender; Base: Vetiver"`).
//! Segments are separated by `;` or `|`. Unlabelled entries land in `top`.

use serde::{Deserialize, Serialize};

/// Top, middle and base notes, each in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notes {
    /// Opening notes
    #[serde(default)]
    pub top: Vec<String>,
    /// Heart notes
    #[serde(default)]
    pub middle: Vec<String>,
    /// Dry-down notes
    #[serde(default)]
    pub base: Vec<String>,
}

#[derive(Clone, Copy)]
enum Group {
    Top,
    Middle,
    Base,
}

fn split_label(segment: &str) -> (Option<Group>, &str) {
    let Some((label, rest)) = segment.split_once(':') else {
        return (None, segment);
    };
    let group = match label.trim().to_lowercase().as_str() {
        "top" | "head" | "top notes" => Group::Top,
        "middle" | "heart" | "middle notes" | "heart notes" => Group::Middle,
        "base" | "base notes" => Group::Base,
        _ => return (None, segment),
    };
    (Some(group), rest)
}

impl Notes {
    /// Parses a notes cell. Returns `None` when the text holds no notes.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut notes = Self::default();

        for segment in text.split([';', '|']) {
            let (group, list) = split_label(segment);
            let target = match group.unwrap_or(Group::Top) {
                Group::Top => &mut notes.top,
                Group::Middle => &mut notes.middle,
                Group::Base => &mut notes.base,
            };
            target.extend(
                list.split(',')
                    .map(str::trim)
                    .filter(|note| !note.is_empty())
                    .map(ToString::to_string),
            );
        }

        (!notes.is_empty()).then_some(notes)
    }

    /// True when no group holds a note.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.middle.is_empty() && self.base.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_list_goes_to_top() {
        let notes = Notes::parse("Cardamom, Lavender ,Vetiver").unwrap_or_default();
        assert_eq!(notes.top, vec!["Cardamom", "Lavender", "Vetiver"]);
        assert!(notes.middle.is_empty());
        assert!(notes.base.is_empty());
    }

    #[test]
    fn test_labelled_groups() {
        let notes = Notes::parse("Top: Bergamot, Lemon; Heart: Lavender | BASE: Vetiver, Caraway")
            .unwrap_or_default();
        assert_eq!(notes.top, vec!["Bergamot", "Lemon"]);
        assert_eq!(notes.middle, vec!["Lavender"]);
        assert_eq!(notes.base, vec!["Vetiver", "Caraway"]);
    }

    #[test]
    fn test_unknown_label_kept_as_text() {
        let notes = Notes::parse("Accord: Leather").unwrap_or_default();
        assert_eq!(notes.top, vec!["Accord: Leather"]);
    }

    #[test]
    fn test_blank_text_is_none() {
        assert!(Notes::parse("  , ; ").is_none());
        assert!(Notes::parse("").is_none());
    }
}
