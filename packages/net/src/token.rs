//! Token classes and token-keyed snapshots.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// RGB display color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A named resource class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub enabled: bool,
    /// Initial count
    pub count: u32,
    pub color: Color,
}

impl Token {
    pub fn new(id: impl Into<String>, enabled: bool, count: u32, color: Color) -> Self {
        Self {
            id: id.into(),
            enabled,
            count,
            color,
        }
    }

    /// Editable attributes other than the identifier
    pub fn attributes(&self) -> TokenAttributes {
        TokenAttributes {
            enabled: self.enabled,
            count: self.count,
            color: self.color,
        }
    }

    pub fn set_attributes(&mut self, attributes: TokenAttributes) {
        self.enabled = attributes.enabled;
        self.count = attributes.count;
        self.color = attributes.color;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenAttributes {
    pub enabled: bool,
    pub count: u32,
    pub color: Color,
}

/// Everything in a net keyed by token identifier.
///
/// Captured before a token operation so it can be rolled back, and stored in
/// history so token edits can be undone.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TokenState {
    pub tokens: Vec<Token>,
    /// place id -> marking
    pub markings: IndexMap<String, IndexMap<String, u32>>,
    /// arc id -> weights
    pub weights: IndexMap<String, IndexMap<String, String>>,
}

impl TokenState {
    pub fn token_ids(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|t| t.id.as_str())
    }
}
