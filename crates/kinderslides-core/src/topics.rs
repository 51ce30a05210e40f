use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Topics the generator knows how to build a deck for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "ABC")]
    Abc,
    #[serde(rename = "Numbers 1-5")]
    Numbers,
    #[serde(rename = "Shapes")]
    Shapes,
    #[serde(rename = "Colors")]
    Colors,
}

impl Topic {
    /// All topics, in selector order.
    pub const ALL: [Topic; 4] = [Topic::Abc, Topic::Numbers, Topic::Shapes, Topic::Colors];

    /// The selector value, also used verbatim in button copy.
    pub fn label(self) -> &'static str {
        match self {
            Topic::Abc => "ABC",
            Topic::Numbers => "Numbers 1-5",
            Topic::Shapes => "Shapes",
            Topic::Colors => "Colors",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Topic::Abc => "26 beautiful slides covering A-Z with fun illustrations!",
            Topic::Numbers => "5 colorful slides to help kids learn counting!",
            Topic::Shapes => "6 slides featuring basic shapes with fun examples!",
            Topic::Colors => "8 vibrant slides teaching primary and secondary colors!",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Topic::Abc => "fas fa-font",
            Topic::Numbers => "fas fa-calculator",
            Topic::Shapes => "fas fa-shapes",
            Topic::Colors => "fas fa-palette",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Topic::Abc => "text-primary",
            Topic::Numbers => "text-success",
            Topic::Shapes => "text-warning",
            Topic::Colors => "text-info",
        }
    }

    /// One entry per content slide of the generated deck.
    pub fn items(self) -> &'static [&'static str] {
        match self {
            Topic::Abc => &[
                "A - Apple", "B - Ball", "C - Cat", "D - Dog", "E - Elephant", "F - Fish",
                "G - Giraffe", "H - House", "I - Ice cream", "J - Jellyfish", "K - Kite",
                "L - Lion", "M - Moon", "N - Nest", "O - Orange", "P - Penguin", "Q - Queen",
                "R - Rainbow", "S - Sun", "T - Tree", "U - Umbrella", "V - Violin", "W - Whale",
                "X - X-ray", "Y - Yacht", "Z - Zebra",
            ],
            Topic::Numbers => &["1 - One", "2 - Two", "3 - Three", "4 - Four", "5 - Five"],
            Topic::Shapes => &["Circle", "Square", "Triangle", "Rectangle", "Star", "Heart"],
            Topic::Colors => &[
                "Red", "Blue", "Yellow", "Green", "Orange", "Purple", "Pink", "Brown",
            ],
        }
    }

    pub fn slide_count(self) -> usize {
        self.items().len()
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A selector value that names no known topic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown topic '{0}'")]
pub struct UnknownTopic(pub String);

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| UnknownTopic(s.to_string()))
    }
}

/// Parse a raw selector value. Blank input means "nothing selected".
pub fn parse_selection(raw: &str) -> Result<Option<Topic>, UnknownTopic> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse().map(Some)
}
