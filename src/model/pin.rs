use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Position;

pub const PALETTE: [&str; 6] = [
    "#e74c3c", "#3498db", "#2ecc71", "#f39c12", "#9b59b6", "#1abc9c",
];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Pin {
    pub id: String,
    #[serde(rename = "type")]
    pub pin_type: PinType,
    pub name: String,
    pub description: String,
    pub color: Color,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Pin {
    pub fn new(id: String, draft: PinDraft) -> Pin {
        Pin {
            id,
            pin_type: draft.pin_type,
            name: draft.name,
            description: draft.description,
            color: draft.color,
            position: draft.position,
            link: draft.link,
        }
    }

    /// Overwrites every field except the id.
    pub fn replace(&mut self, draft: PinDraft) {
        self.pin_type = draft.pin_type;
        self.name = draft.name;
        self.description = draft.description;
        self.color = draft.color;
        self.position = draft.position;
        self.link = draft.link;
    }

    pub fn draft(&self) -> PinDraft {
        PinDraft {
            pin_type: self.pin_type,
            name: self.name.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
            position: self.position,
            link: self.link.clone(),
        }
    }
}

/// Pin fields prior to id assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct PinDraft {
    pub pin_type: PinType,
    pub name: String,
    pub description: String,
    pub color: Color,
    pub position: Position,
    pub link: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PinType {
    Stay,
    Eat,
    Activity,
}

impl PinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PinType::Stay => "stay",
            PinType::Eat => "eat",
            PinType::Activity => "activity",
        }
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for PinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stay" => Ok(PinType::Stay),
            "eat" => Ok(PinType::Eat),
            "activity" => Ok(PinType::Activity),
            other => Err(other.to_string()),
        }
    }
}

/// Hex color, `#rgb` or `#rrggbb`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub fn parse(value: &str) -> Option<Color> {
        let value = value.trim();
        let hex = value.strip_prefix('#')?;

        if (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|it| it.is_ascii_hexdigit()) {
            Some(Color(value.to_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Color(PALETTE[0].to_string())
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value).ok_or_else(|| format!("invalid color {value}"))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
