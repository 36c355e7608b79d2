//! Identifier kinds that can be renamed.

use crate::ForgeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A controlled-vocabulary identifier category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierKind {
    Tag,
    TagGroup,
    AssetType,
    Style,
    Scenario,
    Palette,
    Checkpoint,
    Lora,
}

impl IdentifierKind {
    pub const ALL: [IdentifierKind; 8] = [
        IdentifierKind::Tag,
        IdentifierKind::TagGroup,
        IdentifierKind::AssetType,
        IdentifierKind::Style,
        IdentifierKind::Scenario,
        IdentifierKind::Palette,
        IdentifierKind::Checkpoint,
        IdentifierKind::Lora,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Tag => "tag",
            IdentifierKind::TagGroup => "tagGroup",
            IdentifierKind::AssetType => "assetType",
            IdentifierKind::Style => "style",
            IdentifierKind::Scenario => "scenario",
            IdentifierKind::Palette => "palette",
            IdentifierKind::Checkpoint => "checkpoint",
            IdentifierKind::Lora => "lora",
        }
    }

    /// Whether the identifier is also the file stem of its own document.
    pub fn is_primary_key(&self) -> bool {
        matches!(self, IdentifierKind::Checkpoint | IdentifierKind::Lora)
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierKind {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdentifierKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ForgeError::UnknownKind(s.to_string()))
    }
}
