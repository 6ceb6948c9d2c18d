//! Beverage recipe catalog.
//!
//! The plant runs a fixed catalog; recipe selection writes are validated
//! against it and everything else is rejected. `RECIPE_NONE` is the
//! sentinel for "no recipe loaded" and is deliberately not part of the
//! catalog: it can never be selected, only observed.

use serde::{Deserialize, Serialize};

/// Sentinel recipe name reported while the filler has no recipe loaded.
pub const RECIPE_NONE: &str = "None";

/// Names of the recipes the filler can produce.
pub const DEFAULT_RECIPES: [&str; 5] = [
    "Still Water",
    "Sparkling Water",
    "Cola",
    "Orange Juice",
    "Energy Drink",
];

/// Validated recipe catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeBook {
    names: Vec<String>,
}

impl RecipeBook {
    /// Catalog from explicit names. Order is preserved (it is the order
    /// clients see in the published `Catalog` variable).
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// True when `name` is a selectable recipe.
    pub fn is_known(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for RecipeBook {
    fn default() -> Self {
        Self {
            names: DEFAULT_RECIPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
