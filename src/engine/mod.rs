//! Trait boundary to the external rendering engine
//!
//! The rendering engine owns content loading, pagination, and the isolated
//! per-chapter rendering contexts. This crate only ever sees it through the
//! traits here: a host handle for theme registration and context
//! enumeration, per-context handles for styling and measurement, lifecycle
//! events, and the settle-wait scheduler.
//!
//! Context handles are borrowed per callback and never cached; the engine
//! may destroy and recreate them at will, so every accessor is fallible.

use crate::theme::{Declaration, RuleSet, ThemeName};
use crate::utils::Result;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Measured intrinsic size of a context's content, in CSS pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContentMetrics {
    pub scroll_height: f64,
    pub offset_height: f64,
    pub client_height: f64,
}

impl ContentMetrics {
    /// The height the hosting container must reach to avoid clipping
    pub fn intrinsic_height(&self) -> f64 {
        self.scroll_height
            .max(self.offset_height)
            .max(self.client_height)
    }
}

/// Handle to one isolated embedded document mounted by the rendering
/// engine (one per visible chapter/page).
///
/// Every method can fail with `ContextUnreachable` at any time; callers
/// skip the context for the current pass and never propagate the error.
pub trait RenderingContext: Send + Sync {
    /// Structured stylesheet-rule capability. `None` means the context
    /// does not expose it; `Some` yields a completion future to await.
    fn add_stylesheet_rules(&self, rules: &RuleSet) -> Option<BoxFuture<'static, Result<()>>>;

    /// Insert serialized CSS as a `<style>` element first in the
    /// document head
    fn insert_head_style(&self, css_text: &str) -> Result<()>;

    /// Assign declarations directly on the document element
    fn style_root(&self, declarations: &[Declaration]) -> Result<()>;

    /// Assign declarations directly on the body element
    fn style_body(&self, declarations: &[Declaration]) -> Result<()>;

    /// Assign declarations directly on every anchor element
    fn style_anchors(&self, declarations: &[Declaration]) -> Result<()>;

    /// Hide or show the context's root and body
    fn set_hidden(&self, hidden: bool) -> Result<()>;

    /// Read the content's intrinsic size
    fn content_metrics(&self) -> Result<ContentMetrics>;

    /// Resize the hosting element to the given pixel height
    fn set_container_height(&self, px: f64) -> Result<()>;
}

/// Handle to the rendering engine's container/manager surface
pub trait RendererHost: Send + Sync {
    /// Register a named rule object with the engine's own theme surface
    fn register_theme(&self, name: ThemeName, rules: &RuleSet) -> Result<()>;

    /// Select a previously registered theme by name
    fn select_theme(&self, name: ThemeName) -> Result<()>;

    /// Set the engine's default rule object
    fn set_default_rules(&self, rules: &RuleSet) -> Result<()>;

    /// Snapshot of every currently mounted context. Enumerated fresh per
    /// callback; the result is never cached by this crate.
    fn mounted_contexts(&self) -> Vec<Arc<dyn RenderingContext>>;

    /// Ask the engine to recompute its own layout
    fn recompute_layout(&self);

    /// Mark the outer scroll container's height as automatic
    fn set_viewport_height_auto(&self);
}

/// Lifecycle stages signaled by the rendering engine.
///
/// Each carries the affected context when the engine provides one; events
/// without a payload apply to every mounted context.
#[derive(Clone)]
pub enum LifecycleEvent {
    /// Chapter load has started; content is not yet in the document
    LoadStarted(Option<Arc<dyn RenderingContext>>),
    /// Content is about to be attached to a context
    ContentMounting(Option<Arc<dyn RenderingContext>>),
    /// A context finished rendering its content
    Rendered(Arc<dyn RenderingContext>),
    /// Navigation moved the reading position; contexts may be reused
    Relocated,
    /// The engine changed its layout mode or dimensions
    LayoutChanged,
    /// The engine finished displaying; final re-assertion point
    Displayed,
    /// Generic activation signal from the engine
    MarkActivated,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::LoadStarted(_) => "load-started",
            LifecycleEvent::ContentMounting(_) => "content-mounting",
            LifecycleEvent::Rendered(_) => "rendered",
            LifecycleEvent::Relocated => "relocated",
            LifecycleEvent::LayoutChanged => "layout-changed",
            LifecycleEvent::Displayed => "displayed",
            LifecycleEvent::MarkActivated => "mark-activated",
        }
    }
}

impl fmt::Debug for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Nominal duration of one animation frame
pub const FRAME_INTERVAL_MS: u64 = 16;

/// Upper bound on any single settle wait; the wait always fires
pub const SETTLE_CAP_MS: u64 = 250;

/// The settle-wait primitive: a bounded delay approximating N
/// animation-frame boundaries, letting the style/layout pass catch up
/// before a visibility or measurement decision.
///
/// The frame count is an empirically tuned constant, not a completion
/// signal; implementations must always fire within [`SETTLE_CAP_MS`].
pub trait FrameScheduler: Send + Sync {
    fn settle(&self, frames: u32) -> BoxFuture<'static, ()>;
}

/// Production scheduler backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFrameScheduler;

impl FrameScheduler for TokioFrameScheduler {
    fn settle(&self, frames: u32) -> BoxFuture<'static, ()> {
        let ms = (u64::from(frames) * FRAME_INTERVAL_MS).min(SETTLE_CAP_MS);
        Box::pin(tokio::time::sleep(Duration::from_millis(ms)))
    }
}

/// Scheduler that completes immediately. For headless hosts and tests
/// where frame timing does not exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScheduler;

impl FrameScheduler for ImmediateScheduler {
    fn settle(&self, _frames: u32) -> BoxFuture<'static, ()> {
        Box::pin(futures::future::ready(()))
    }
}
