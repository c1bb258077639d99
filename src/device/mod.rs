//! Device classification and mobile rendering quirks
//!
//! Everything in this module is a pure function: the rest of the engine
//! depends only on [`DeviceClass`] and [`QuirkParams`], never on raw
//! platform strings. User-agent sniffing happens here and nowhere else.

use crate::defaults::{MOBILE_BREAKPOINT_PX, MOBILE_FONT_FLOOR_PX};

/// Coarse device classification driving presentation adjustments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Desktop,
    /// Mobile form factor other than iOS (Android, e-readers, etc.)
    MobileOther,
    /// iOS WebKit, which has its own compositing defects
    MobileIos,
}

impl DeviceClass {
    /// Mobile form factors get FOUC gating and the font-size floor
    pub fn is_mobile(&self) -> bool {
        !matches!(self, DeviceClass::Desktop)
    }
}

/// User-agent tokens that identify iOS WebKit
const IOS_TOKENS: [&str; 3] = ["iphone", "ipad", "ipod"];

/// User-agent tokens that identify other mobile/embedded browsers
const MOBILE_TOKENS: [&str; 5] = ["android", "mobile", "silk", "kindle", "webos"];

/// Classify a device from its viewport width and user-agent signal.
///
/// A narrow viewport counts as mobile even without a matching UA token,
/// since the defects this engine compensates for track form factor more
/// than platform.
pub fn classify(viewport_width_px: u32, user_agent: &str) -> DeviceClass {
    let ua = user_agent.to_lowercase();

    if IOS_TOKENS.iter().any(|t| ua.contains(t)) {
        return DeviceClass::MobileIos;
    }
    if MOBILE_TOKENS.iter().any(|t| ua.contains(t)) {
        return DeviceClass::MobileOther;
    }
    if viewport_width_px < MOBILE_BREAKPOINT_PX {
        return DeviceClass::MobileOther;
    }
    DeviceClass::Desktop
}

/// Presentation adjustments for one device class, consumed by the theme
/// registry and injector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuirkParams {
    /// Generated font size never drops below this (0 = no floor).
    /// 16px on mobile prevents zoom-on-focus on iOS WebKit.
    pub min_font_px: u32,
    /// Vertical content padding in em
    pub padding_vertical_em: f32,
    /// Horizontal content padding as percent of context width
    pub padding_horizontal_percent: f32,
    /// Emit hardware-compositing hints. Helps scrolling on Android;
    /// disabled on iOS where it triggers rendering corruption.
    pub accelerated_compositing: bool,
    /// Emit tap-highlight / touch-callout suppression rules
    pub suppress_tap_highlight: bool,
}

/// Quirk parameters for a device class
pub fn quirks(class: DeviceClass) -> QuirkParams {
    match class {
        DeviceClass::Desktop => QuirkParams {
            min_font_px: 0,
            padding_vertical_em: 0.0,
            padding_horizontal_percent: 4.0,
            accelerated_compositing: false,
            suppress_tap_highlight: false,
        },
        DeviceClass::MobileOther => QuirkParams {
            min_font_px: MOBILE_FONT_FLOOR_PX,
            padding_vertical_em: 1.0,
            padding_horizontal_percent: 5.0,
            accelerated_compositing: true,
            suppress_tap_highlight: true,
        },
        DeviceClass::MobileIos => QuirkParams {
            min_font_px: MOBILE_FONT_FLOOR_PX,
            padding_vertical_em: 1.0,
            padding_horizontal_percent: 5.0,
            accelerated_compositing: false,
            suppress_tap_highlight: true,
        },
    }
}
