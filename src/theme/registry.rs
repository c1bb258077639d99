//! Theme definitions and structured rule generation
//!
//! The registry owns the fixed set of named themes and turns a
//! (theme, font size, device class) triple into the complete ordered rule
//! set injected into every rendering context. Generation is pure: equal
//! inputs always produce structurally equal output.

use super::rules::{decl, Color, RuleSet, Unit, Value};
use crate::device::{quirks, DeviceClass};

/// Named theme variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeName {
    Light,
    Dark,
}

impl ThemeName {
    /// All registered theme names, in registration order
    pub const ALL: [ThemeName; 2] = [ThemeName::Light, ThemeName::Dark];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeName::Light => "light",
            ThemeName::Dark => "dark",
        }
    }

    /// Parse a theme name as received from a settings collaborator
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "light" => Some(ThemeName::Light),
            "dark" => Some(ThemeName::Dark),
            _ => None,
        }
    }
}

impl std::fmt::Display for ThemeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One theme's palette. Immutable, defined at startup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub name: ThemeName,
    pub background: Color,
    pub foreground: Color,
    pub selection_background: Color,
    pub link_color: Color,
}

/// The fixed set of themes. Cardinality 2 today; the lookup is total so
/// adding a variant only touches this module.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeSet {
    light: Theme,
    dark: Theme,
}

impl ThemeSet {
    pub fn get(&self, name: ThemeName) -> &Theme {
        match name {
            ThemeName::Light => &self.light,
            ThemeName::Dark => &self.dark,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Theme> {
        [&self.light, &self.dark].into_iter()
    }
}

/// Serif stack for body text
const BODY_FONT_STACK: &str =
    "Georgia, \"Iowan Old Style\", \"Palatino Linotype\", \"Times New Roman\", serif";

/// Monospace stack for code blocks
const MONO_FONT_STACK: &str = "\"SF Mono\", Menlo, Consolas, \"Liberation Mono\", monospace";

/// Font size after applying the device floor. The floor only ever raises.
pub fn effective_font_px(requested_px: u32, device: DeviceClass) -> u32 {
    requested_px.max(quirks(device).min_font_px)
}

/// Owns theme definitions and generates structured rule sets
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    themes: ThemeSet,
}

impl ThemeRegistry {
    /// Define both named themes. Called once at startup.
    pub fn new() -> Self {
        Self {
            themes: ThemeSet {
                light: Theme {
                    name: ThemeName::Light,
                    background: Color::rgb(0xff, 0xff, 0xff),
                    foreground: Color::rgb(0x1c, 0x1b, 0x1a),
                    selection_background: Color::rgb(0xcd, 0xe3, 0xff),
                    link_color: Color::rgb(0x00, 0x66, 0xcc),
                },
                dark: Theme {
                    name: ThemeName::Dark,
                    background: Color::rgb(0x12, 0x12, 0x12),
                    foreground: Color::rgb(0xd8, 0xd4, 0xcf),
                    selection_background: Color::rgb(0x3b, 0x4c, 0x6a),
                    link_color: Color::rgb(0x8a, 0xb4, 0xf8),
                },
            },
        }
    }

    pub fn theme(&self, name: ThemeName) -> &Theme {
        self.themes.get(name)
    }

    pub fn themes(&self) -> impl Iterator<Item = &Theme> {
        self.themes.iter()
    }

    /// Base document-level rules handed to the rendering engine's own theme
    /// registration surface. Unlike the injected set, links keep their
    /// palette color and hover underline here; the engine applies these to
    /// content this crate never reaches directly.
    pub fn base_rules(&self, name: ThemeName, font_size_px: u32, device: DeviceClass) -> RuleSet {
        let theme = self.themes.get(name);
        let font_px = effective_font_px(font_size_px, device) as f32;

        let mut set = RuleSet::new();
        set.push(
            "body",
            vec![
                decl("background-color", Value::Color(theme.background)),
                decl("color", Value::Color(theme.foreground)),
                decl("font-family", Value::Raw(BODY_FONT_STACK.to_string())),
                decl("font-size", Value::px(font_px)),
                decl("line-height", Value::Number(1.75)),
                decl("letter-spacing", Value::em(0.01)),
            ],
        );
        set.push("a", vec![decl("color", Value::Color(theme.link_color))]);
        set.push(
            "a:hover",
            vec![decl("text-decoration", Value::keyword("underline"))],
        );
        set.push(
            "::selection",
            vec![decl(
                "background-color",
                Value::Color(theme.selection_background),
            )],
        );
        set
    }

    /// Generate the complete injected rule set for one theme at one font
    /// size on one device class.
    ///
    /// Order matters and is stable: base colors, typography hierarchy, link
    /// defanging, footnote normalization, block inheritance, block-element
    /// treatment, selection highlight, then device quirks.
    pub fn generate_rule_set(
        &self,
        name: ThemeName,
        font_size_px: u32,
        device: DeviceClass,
    ) -> RuleSet {
        let theme = self.themes.get(name);
        let q = quirks(device);
        let font_px = effective_font_px(font_size_px, device) as f32;
        let fg = theme.foreground;
        // Muted tone for borders, derived from the foreground
        let muted = Color::rgba(fg.r, fg.g, fg.b, 77);
        let code_background = if is_dark(theme.background) {
            Color::rgba(255, 255, 255, 18)
        } else {
            Color::rgba(0, 0, 0, 13)
        };

        let mut set = RuleSet::new();

        set.push(
            "html",
            vec![
                decl("background-color", Value::Color(theme.background)),
                decl("color", Value::Color(theme.foreground)),
            ],
        );

        let mut body = vec![
            decl("background-color", Value::Color(theme.background)),
            decl("color", Value::Color(theme.foreground)),
            decl("font-family", Value::Raw(BODY_FONT_STACK.to_string())),
            decl("font-size", Value::px(font_px)),
            decl("line-height", Value::Number(1.75)),
            decl("letter-spacing", Value::em(0.01)),
            decl("margin", Value::Number(0.0)),
            decl(
                "padding",
                Value::Raw(format!(
                    "{}em {}%",
                    q.padding_vertical_em, q.padding_horizontal_percent
                )),
            ),
            decl("text-rendering", Value::keyword("optimizeLegibility")),
            decl("overflow-wrap", Value::keyword("break-word")),
        ];
        if q.accelerated_compositing {
            body.push(decl("transform", Value::Raw("translateZ(0)".to_string())));
            body.push(decl("backface-visibility", Value::keyword("hidden")));
        }
        if q.suppress_tap_highlight {
            body.push(decl(
                "-webkit-tap-highlight-color",
                Value::keyword("transparent"),
            ));
            body.push(decl("-webkit-touch-callout", Value::keyword("none")));
        }
        set.push("body", body);

        // Heading hierarchy: shared treatment, then per-level sizing
        set.push(
            "h1, h2, h3, h4, h5, h6",
            vec![
                decl("color", Value::keyword("inherit")),
                decl("font-weight", Value::Number(600.0)),
                decl("line-height", Value::Number(1.3)),
                decl("letter-spacing", Value::em(-0.01)),
                decl("margin", Value::Raw("1.4em 0 0.6em 0".to_string())),
            ],
        );
        for (selector, size_em) in [
            ("h1", 1.9),
            ("h2", 1.6),
            ("h3", 1.35),
            ("h4", 1.15),
            ("h5", 1.05),
            ("h6", 1.0),
        ] {
            set.push(selector, vec![decl("font-size", Value::em(size_em))]);
        }

        set.push(
            "p",
            vec![
                decl("margin", Value::Raw("0 0 0.9em 0".to_string())),
                decl("text-align", Value::keyword("justify")),
                decl("hyphens", Value::keyword("auto")),
            ],
        );

        // Link defanging: navigation belongs to the host, so in-document
        // hyperlinks read as plain text
        set.push(
            "a, a:visited, a:hover, a:active",
            vec![
                decl("color", Value::keyword("inherit")),
                decl("text-decoration", Value::keyword("none")),
                decl("cursor", Value::keyword("default")),
            ],
        );

        // Footnote and endnote markers across common conventions get the
        // same plain-text treatment
        set.push(
            "sup a, sub a, a.footnote, a[role=\"doc-noteref\"], a[epub\\:type=\"noteref\"]",
            vec![
                decl("color", Value::keyword("inherit")),
                decl("text-decoration", Value::keyword("none")),
            ],
        );

        // Container elements inherit the theme colors instead of carrying
        // publisher-set ones
        set.push(
            "div, span, li, dd, dt, figcaption, section, article",
            vec![
                decl("color", Value::keyword("inherit")),
                decl("background-color", Value::keyword("transparent")),
            ],
        );

        set.push(
            "blockquote",
            vec![
                decl("color", Value::keyword("inherit")),
                decl("margin", Value::Raw("1em 2em".to_string())),
                decl("padding-left", Value::em(1.0)),
                decl(
                    "border-left",
                    Value::Raw(format!("3px solid {}", muted.to_css_string())),
                ),
            ],
        );

        set.push(
            "code, pre",
            vec![
                decl("font-family", Value::Raw(MONO_FONT_STACK.to_string())),
                decl("font-size", Value::em(0.9)),
                decl("background-color", Value::Color(code_background)),
                decl("color", Value::keyword("inherit")),
            ],
        );
        set.push(
            "pre",
            vec![
                decl("padding", Value::em(1.0)),
                decl("overflow-x", Value::keyword("auto")),
            ],
        );

        set.push(
            "table",
            vec![
                decl("border-collapse", Value::keyword("collapse")),
                decl("width", Value::Length(100.0, Unit::Percent)),
                decl("color", Value::keyword("inherit")),
            ],
        );
        set.push(
            "td, th",
            vec![
                decl(
                    "border",
                    Value::Raw(format!("1px solid {}", muted.to_css_string())),
                ),
                decl("padding", Value::Raw("0.3em 0.5em".to_string())),
            ],
        );

        set.push(
            "img, svg",
            vec![
                decl("max-width", Value::Length(100.0, Unit::Percent)),
                decl("height", Value::keyword("auto")),
            ],
        );

        set.push(
            "::selection",
            vec![
                decl(
                    "background-color",
                    Value::Color(theme.selection_background),
                ),
                decl("color", Value::Color(theme.foreground)),
            ],
        );

        set
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn is_dark(background: Color) -> bool {
    let luminance =
        (u16::from(background.r) + u16::from(background.g) + u16::from(background.b)) / 3;
    luminance < 128
}
