//! Recipe payload codec.
//!
//! Structured recipes travel inside the post's free-text `caption` field as
//! JSON. Older posts are plain text, so decoding has a hard contract: it
//! never fails, and anything unparseable becomes the plain-text fallback
//! shape (empty title, no ingredients, instructions = raw caption). The UI
//! layer distinguishes structured recipes from legacy posts solely by
//! whether any ingredients decoded.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: String,
}

impl Ingredient {
    /// Human-readable form.
    ///
    /// A missing or zero quantity, or a missing/`"none"` unit, renders as
    /// the bare name: "salt", never "0 undefined salt".
    #[must_use]
    pub fn display(&self) -> String {
        let quantity = match self.quantity {
            Some(q) if q != 0.0 => q,
            _ => return self.name.clone(),
        };
        let unit = self.unit.trim();
        if unit.is_empty() || unit.eq_ignore_ascii_case("none") {
            return self.name.clone();
        }
        format!("{quantity} {unit} {}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Recipe {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: String,
}

impl Recipe {
    /// Whether this decoded as a structured recipe rather than a legacy
    /// free-text post.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        !self.ingredients.is_empty()
    }

    /// Display lines for the ingredient list.
    #[must_use]
    pub fn display_ingredients(&self) -> Vec<String> {
        self.ingredients.iter().map(Ingredient::display).collect()
    }

    /// Validate a recipe before posting: at least one ingredient, each with
    /// a non-empty name.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message describing the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.ingredients.is_empty() {
            return Err("a recipe needs at least one ingredient".to_string());
        }
        if self.ingredients.iter().any(|i| i.name.trim().is_empty()) {
            return Err("every ingredient needs a name".to_string());
        }
        Ok(())
    }
}

/// Serialize a recipe into a caption string.
#[must_use]
pub fn encode(recipe: &Recipe) -> String {
    serde_json::to_string(recipe).expect("recipe serialization cannot fail")
}

/// Parse a caption into a recipe.
///
/// Never fails: any caption that is not a JSON recipe object comes back as
/// the plain-text fallback with the raw caption in `instructions`.
#[must_use]
pub fn decode(caption: &str) -> Recipe {
    serde_json::from_str(caption).unwrap_or_else(|_| Recipe {
        title: String::new(),
        ingredients: Vec::new(),
        instructions: caption.to_string(),
    })
}
