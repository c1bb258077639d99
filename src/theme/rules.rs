//! Structured style rules and CSS serialization
//!
//! Rules are built as selector -> ordered declaration list and only become
//! CSS text at the injection boundary. That keeps the generated output
//! structurally comparable in tests instead of string-matched.

use crate::utils::Result;
use cssparser::{serialize_identifier, serialize_string};
use std::fmt::{self, Write};

/// CSS value types
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Keyword (e.g., "justify", "inherit")
    Keyword(String),
    /// Length with unit (e.g., 17px)
    Length(f32, Unit),
    /// Color value
    Color(Color),
    /// Number without unit (e.g., line-height 1.75)
    Number(f32),
    /// Quoted string (e.g., a single font family name)
    QuotedString(String),
    /// Pre-serialized value (e.g., a full font stack)
    Raw(String),
}

impl Value {
    /// Keyword value from any string-ish input
    pub fn keyword(k: impl Into<String>) -> Self {
        Self::Keyword(k.into())
    }

    /// Pixel length value
    pub fn px(v: f32) -> Self {
        Self::Length(v, Unit::Px)
    }

    /// Em length value
    pub fn em(v: f32) -> Self {
        Self::Length(v, Unit::Em)
    }

    /// Serialize this value as CSS text
    pub fn to_css<W: Write>(&self, dest: &mut W) -> fmt::Result {
        match self {
            Self::Keyword(k) => dest.write_str(k),
            Self::Length(v, unit) => write!(dest, "{}{}", v, unit.as_str()),
            Self::Color(c) => c.to_css(dest),
            Self::Number(n) => write!(dest, "{}", n),
            Self::QuotedString(s) => serialize_string(s, dest),
            Self::Raw(s) => dest.write_str(s),
        }
    }
}

/// CSS length units used by generated rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Px,
    Em,
    Rem,
    Percent,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Px => "px",
            Unit::Em => "em",
            Unit::Rem => "rem",
            Unit::Percent => "%",
        }
    }
}

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string (#rgb, #rrggbb, #rrggbbaa)
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        // Byte length is only meaningful for ASCII input
        if !hex.is_ascii() {
            return None;
        }
        match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
                Some(Color::rgb(r, g, b))
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                Some(Color::rgb(r, g, b))
            }
            8 => {
                let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
                let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
                let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
                let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
                Some(Color::rgba(r, g, b, a))
            }
            _ => None,
        }
    }

    /// Serialize as `#rrggbb` when opaque, `rgba(...)` otherwise
    pub fn to_css<W: Write>(&self, dest: &mut W) -> fmt::Result {
        if self.a == 255 {
            write!(dest, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(
                dest,
                "rgba({}, {}, {}, {:.3})",
                self.r,
                self.g,
                self.b,
                f32::from(self.a) / 255.0
            )
        }
    }

    /// Serialize to an owned CSS string
    pub fn to_css_string(&self) -> String {
        let mut out = String::new();
        // Writing to a String never fails
        let _ = self.to_css(&mut out);
        out
    }
}

/// CSS declaration (property: value)
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: Value,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: Value) -> Self {
        Self {
            property: property.into(),
            value,
        }
    }

    fn to_css<W: Write>(&self, dest: &mut W) -> fmt::Result {
        serialize_identifier(&self.property, dest)?;
        dest.write_str(": ")?;
        self.value.to_css(dest)
    }
}

/// Shorthand declaration constructor
pub fn decl(property: impl Into<String>, value: Value) -> Declaration {
    Declaration::new(property, value)
}

/// A single rule: selector plus ordered declarations
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

impl StyleRule {
    pub fn new(selector: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        Self {
            selector: selector.into(),
            declarations,
        }
    }

    /// Look up a declaration's value by property name
    pub fn value_of(&self, property: &str) -> Option<&Value> {
        self.declarations
            .iter()
            .find(|d| d.property == property)
            .map(|d| &d.value)
    }

    fn to_css<W: Write>(&self, dest: &mut W) -> fmt::Result {
        dest.write_str(&self.selector)?;
        dest.write_str(" { ")?;
        for declaration in &self.declarations {
            declaration.to_css(dest)?;
            dest.write_str("; ")?;
        }
        dest.write_str("}")
    }
}

/// Ordered set of style rules produced by the theme registry
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleSet {
    pub rules: Vec<StyleRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule, preserving generation order
    pub fn push(&mut self, selector: impl Into<String>, declarations: Vec<Declaration>) {
        self.rules.push(StyleRule::new(selector, declarations));
    }

    /// Find a rule by exact selector text
    pub fn find(&self, selector: &str) -> Option<&StyleRule> {
        self.rules.iter().find(|r| r.selector == selector)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Serialize the whole set to CSS text, one rule per line
    pub fn to_css_string(&self) -> String {
        let mut out = String::new();
        for rule in &self.rules {
            let _ = rule.to_css(&mut out);
            out.push('\n');
        }
        out
    }
}

/// Validate that serialized output tokenizes as CSS. Used by tests and
/// debug assertions, not on the hot path.
pub fn parses_as_css(css: &str) -> Result<()> {
    use crate::utils::LecternError;
    use cssparser::{Parser, ParserInput};

    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    while !parser.is_exhausted() {
        parser
            .next()
            .map_err(|e| LecternError::Other(format!("bad css token: {:?}", e.kind)))?;
    }
    Ok(())
}
