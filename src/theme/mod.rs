//! Theme registry and structured style rules
//!
//! Owns the fixed set of named themes and produces the ordered rule sets
//! the injector applies to rendering contexts.

pub mod registry;
pub mod rules;

pub use registry::{effective_font_px, Theme, ThemeName, ThemeRegistry, ThemeSet};
pub use rules::{decl, Color, Declaration, RuleSet, StyleRule, Unit, Value};
