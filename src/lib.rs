//! # Lectern - Render-Lifecycle Theme & Layout Synchronization
//!
//! Theming engine for paginated reflowable-document viewers. The external
//! rendering engine owns chapter loading and pagination; lectern reacts to
//! its lifecycle events and imposes a consistent visual theme on content
//! the engine mounts into isolated rendering contexts.
//!
//! ## Architecture
//!
//! The engine is organized into the following core modules:
//!
//! - **coordinator**: lifecycle event handling and the public control surface
//! - **theme**: named themes and structured rule generation
//! - **inject**: ranked style-injection mechanisms with fallthrough
//! - **gate**: flash-of-unstyled-content gating on mobile
//! - **height**: container height sync for continuous-scroll layouts
//! - **device**: device classification and mobile rendering quirks
//! - **engine**: trait boundary to the external rendering engine
//! - **utils**: shared utilities and error types
//!
//! Everything is best-effort: a failed injection degrades to the next
//! mechanism, an unreachable context is skipped, and no error ever crosses
//! the public API.

pub mod coordinator;
pub mod device;
pub mod engine;
pub mod gate;
pub mod height;
pub mod inject;
pub mod theme;
pub mod utils;

// Re-export main types for convenience
pub use coordinator::{ContextStage, LifecycleCoordinator, Subscription};
pub use device::{classify, quirks, DeviceClass, QuirkParams};
pub use engine::{
    ContentMetrics, FrameScheduler, ImmediateScheduler, LifecycleEvent, RendererHost,
    RenderingContext, TokioFrameScheduler,
};
pub use inject::{ContentInjector, InjectionOutcome, InjectionReport, Mechanism};
pub use theme::{Color, RuleSet, Theme, ThemeName, ThemeRegistry};
pub use utils::error::{LecternError, Result};

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Lectern";

/// Presentation constants. The settle frame count is empirically tuned,
/// not derived from a completion signal; treat it as tunable.
pub mod defaults {
    /// Default body font size in pixels
    pub const DEFAULT_FONT_SIZE_PX: u32 = 17;
    /// Font size floor applied on mobile device classes
    pub const MOBILE_FONT_FLOOR_PX: u32 = 16;
    /// Animation-frame boundaries waited before reveal and measurement
    pub const SETTLE_FRAMES: u32 = 2;
    /// Viewport width below which a context is classified mobile
    pub const MOBILE_BREAKPOINT_PX: u32 = 768;
}
