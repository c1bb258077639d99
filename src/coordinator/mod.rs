//! Lifecycle coordination and the public control surface
//!
//! The coordinator owns the manager state (current theme, font size,
//! initialized/destroyed flags) and the observer registry, subscribes to
//! the rendering engine's lifecycle events, and drives the theme registry,
//! injector, visibility gate, and height adjuster at each stage.
//!
//! All shared state is mutated synchronously within a single callback turn;
//! the `destroyed` flag is the only cancellation primitive and is checked
//! after every await, so nothing mutates a context once `destroy` ran.

use crate::defaults::DEFAULT_FONT_SIZE_PX;
use crate::device::DeviceClass;
use crate::engine::{FrameScheduler, LifecycleEvent, RendererHost, RenderingContext};
use crate::gate::VisibilityGate;
use crate::height::HeightAdjuster;
use crate::inject::{ContentInjector, InjectionOutcome, InjectionReport, Mechanism};
use crate::theme::{RuleSet, ThemeName, ThemeRegistry};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Stages one rendering context passes through during a styling pass.
/// Tracked for diagnostics only; nothing persists between passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStage {
    Unstyled,
    StylesPending,
    StylesApplied,
    InjectionFailed,
    FallbackStyled,
    Visible,
    /// The context became unreachable before completion
    Abandoned,
}

fn stage_for(report: &InjectionReport) -> ContextStage {
    match report.outcome {
        InjectionOutcome::Styled(Mechanism::DirectStyles) => ContextStage::FallbackStyled,
        InjectionOutcome::Styled(_) => ContextStage::StylesApplied,
        InjectionOutcome::Unstyled => ContextStage::InjectionFailed,
        InjectionOutcome::Abandoned => ContextStage::Abandoned,
    }
}

/// Theme and typography state owned exclusively by the coordinator
struct ManagerState {
    current_theme: ThemeName,
    font_size_px: u32,
}

type ObserverFn = Arc<dyn Fn() + Send + Sync>;
type ObserverList = Mutex<Vec<(u64, ObserverFn)>>;

/// Handle returned by [`LifecycleCoordinator::on_theme_applied`]; consumes
/// itself to remove the observer
pub struct Subscription {
    id: u64,
    observers: Weak<ObserverList>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(observers) = self.observers.upgrade() {
            if let Ok(mut list) = observers.lock() {
                list.retain(|(id, _)| *id != self.id);
            }
        }
    }
}

/// Drives theming across the render lifecycle and exposes the public
/// control surface consumed by reader UI and settings collaborators
pub struct LifecycleCoordinator {
    host: Arc<dyn RendererHost>,
    scheduler: Arc<dyn FrameScheduler>,
    device: DeviceClass,
    registry: ThemeRegistry,
    injector: ContentInjector,
    gate: VisibilityGate,
    heights: HeightAdjuster,
    state: Mutex<ManagerState>,
    observers: Arc<ObserverList>,
    next_observer_id: AtomicU64,
    initialized: AtomicBool,
    destroyed: Arc<AtomicBool>,
}

impl LifecycleCoordinator {
    /// Coordinator starting on the light theme at the default font size
    pub fn new(
        host: Arc<dyn RendererHost>,
        scheduler: Arc<dyn FrameScheduler>,
        device: DeviceClass,
    ) -> Self {
        Self::with_initial(host, scheduler, device, ThemeName::Light, DEFAULT_FONT_SIZE_PX)
    }

    /// Coordinator with explicit initial theme and font size, as restored
    /// by a settings collaborator
    pub fn with_initial(
        host: Arc<dyn RendererHost>,
        scheduler: Arc<dyn FrameScheduler>,
        device: DeviceClass,
        theme: ThemeName,
        font_size_px: u32,
    ) -> Self {
        let destroyed = Arc::new(AtomicBool::new(false));
        Self {
            gate: VisibilityGate::new(device, Arc::clone(&scheduler), Arc::clone(&destroyed)),
            heights: HeightAdjuster::new(Arc::clone(&scheduler), Arc::clone(&destroyed)),
            host,
            scheduler,
            device,
            registry: ThemeRegistry::new(),
            injector: ContentInjector::new(),
            state: Mutex::new(ManagerState {
                current_theme: theme,
                font_size_px: font_size_px.max(1),
            }),
            observers: Arc::new(Mutex::new(Vec::new())),
            next_observer_id: AtomicU64::new(0),
            initialized: AtomicBool::new(false),
            destroyed,
        }
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn snapshot(&self) -> (ThemeName, u32) {
        self.state
            .lock()
            .map(|s| (s.current_theme, s.font_size_px))
            .unwrap_or((ThemeName::Light, DEFAULT_FONT_SIZE_PX))
    }

    /// Current theme name
    pub fn theme(&self) -> ThemeName {
        self.snapshot().0
    }

    /// Current requested font size in pixels (before any device floor)
    pub fn font_size(&self) -> u32 {
        self.snapshot().1
    }

    /// Register theme definitions with the engine and apply the initial
    /// theme to any already-mounted contexts. Exactly one call takes
    /// effect; repeats and post-destroy calls are no-ops.
    pub async fn initialize(&self) {
        if self.is_destroyed() {
            return;
        }
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }
        let (theme, font) = self.snapshot();
        self.register_theme_definitions(font);
        log::debug!("initialized with theme {} at {}px", theme, font);
        self.apply_theme(theme, true).await;
    }

    /// Hand both themes' base rule objects to the engine's own theme
    /// surface and set the current one as its default
    fn register_theme_definitions(&self, font_size_px: u32) {
        for name in ThemeName::ALL {
            let rules = self.registry.base_rules(name, font_size_px, self.device);
            if let Err(err) = self.host.register_theme(name, &rules) {
                log::warn!("engine refused theme {}: {}", name, err);
            }
        }
        let (current, _) = self.snapshot();
        let rules = self.registry.base_rules(current, font_size_px, self.device);
        if let Err(err) = self.host.set_default_rules(&rules) {
            log::warn!("engine refused default rules: {}", err);
        }
    }

    /// Switch themes. A no-op when `name` is already current unless
    /// `force`; otherwise updates state, invokes the engine's own theme
    /// hook, restyles every mounted context, then notifies observers.
    pub async fn apply_theme(&self, name: ThemeName, force: bool) {
        if self.is_destroyed() {
            return;
        }
        let proceed = self
            .state
            .lock()
            .map(|mut s| {
                if s.current_theme == name && !force {
                    false
                } else {
                    s.current_theme = name;
                    true
                }
            })
            .unwrap_or(false);
        if !proceed {
            return;
        }

        // The engine hook runs before injection, so injected rules land
        // last and win cascade ties.
        if let Err(err) = self.host.select_theme(name) {
            log::debug!("engine theme hook failed: {}", err);
        }

        self.restyle_all().await;
        if self.is_destroyed() {
            return;
        }
        self.notify_observers();
    }

    /// Force-switch to the named theme
    pub async fn set_theme(&self, name: ThemeName) {
        self.apply_theme(name, true).await;
    }

    /// Change the requested font size. A no-op when unchanged; otherwise
    /// theme definitions are regenerated at the new size and the current
    /// theme is force-reapplied.
    pub async fn set_font_size(&self, px: u32) {
        if self.is_destroyed() {
            return;
        }
        if px == 0 {
            log::warn!("ignoring zero font size");
            return;
        }
        let changed = self
            .state
            .lock()
            .map(|mut s| {
                if s.font_size_px == px {
                    false
                } else {
                    s.font_size_px = px;
                    true
                }
            })
            .unwrap_or(false);
        if !changed {
            return;
        }

        self.register_theme_definitions(px);
        let (theme, _) = self.snapshot();
        self.apply_theme(theme, true).await;
    }

    /// Re-run injection and height adjustment on every mounted context
    /// without touching theme/font state. Used when the engine may have
    /// silently replaced content without firing a lifecycle event.
    pub async fn force_content_refresh(&self) {
        if self.is_destroyed() {
            return;
        }
        self.restyle_all().await;
        if self.is_destroyed() {
            return;
        }
        self.heights.adjust_all(self.host.as_ref()).await;
    }

    /// Re-measure and resize every mounted context's container
    pub async fn adjust_all_heights(&self) {
        if self.is_destroyed() {
            return;
        }
        self.heights.adjust_all(self.host.as_ref()).await;
    }

    /// Register a theme-applied observer. The returned subscription
    /// removes it again.
    pub fn on_theme_applied(
        &self,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_observer_id.fetch_add(1, Ordering::SeqCst);
        if !self.is_destroyed() {
            if let Ok(mut observers) = self.observers.lock() {
                observers.push((id, Arc::new(callback)));
            }
        }
        Subscription {
            id,
            observers: Arc::downgrade(&self.observers),
        }
    }

    /// Tear down. Monotonic: every other public method, and every
    /// continuation already in flight, becomes a no-op.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        if let Ok(mut observers) = self.observers.lock() {
            observers.clear();
        }
        log::debug!("coordinator destroyed");
    }

    /// Entry point for the engine adapter: one call per lifecycle event
    pub async fn handle_event(&self, event: LifecycleEvent) {
        if self.is_destroyed() {
            return;
        }
        log::debug!("lifecycle event: {:?}", event);
        let (theme, font) = self.snapshot();
        let rules = self.registry.generate_rule_set(theme, font, self.device);

        match event {
            LifecycleEvent::LoadStarted(context) | LifecycleEvent::ContentMounting(context) => {
                match context {
                    Some(context) => self.pre_style(context.as_ref(), &rules).await,
                    None => {
                        for context in self.host.mounted_contexts() {
                            if self.is_destroyed() {
                                return;
                            }
                            self.pre_style(context.as_ref(), &rules).await;
                        }
                    }
                }
            }
            LifecycleEvent::Rendered(context) => {
                self.style_context(context.as_ref(), &rules).await;
                if self.is_destroyed() {
                    return;
                }
                self.heights.adjust_height(context.as_ref()).await;
            }
            LifecycleEvent::Relocated | LifecycleEvent::LayoutChanged => {
                // Navigation can reuse contexts whose styling the engine
                // reset; give its internal asynchrony one frame first
                self.scheduler.settle(1).await;
                if self.is_destroyed() {
                    return;
                }
                self.host.recompute_layout();
                self.restyle_all().await;
                if self.is_destroyed() {
                    return;
                }
                self.heights.adjust_all(self.host.as_ref()).await;
            }
            LifecycleEvent::Displayed | LifecycleEvent::MarkActivated => {
                for context in self.host.mounted_contexts() {
                    if self.is_destroyed() {
                        return;
                    }
                    self.reassert(context.as_ref(), &rules).await;
                }
            }
        }
    }

    /// Pre-paint pass: hide on mobile and push styling in early so as much
    /// as possible is in place before first paint. The rendered event runs
    /// the full pipeline with reveal.
    async fn pre_style(&self, context: &dyn RenderingContext, rules: &RuleSet) {
        self.gate.prepare_hidden(context);
        let report = self.injector.inject(context, rules).await;
        log::debug!("pre-style pass: {:?}", report.outcome);
    }

    /// Full pipeline for one context: hide, inject, reveal. Reveal runs
    /// regardless of the injection outcome so content is never left
    /// permanently hidden.
    async fn style_context(&self, context: &dyn RenderingContext, rules: &RuleSet) {
        self.gate.prepare_hidden(context);
        log::debug!(
            "context stage {:?} -> {:?}",
            ContextStage::Unstyled,
            ContextStage::StylesPending
        );

        let report = self.injector.inject(context, rules).await;
        let stage = stage_for(&report);
        log::debug!(
            "context stage {:?} -> {:?}",
            ContextStage::StylesPending,
            stage
        );
        if self.is_destroyed() {
            return;
        }

        self.gate.reveal(context).await;
        if stage != ContextStage::Abandoned && !self.is_destroyed() {
            log::debug!("context stage {:?} -> {:?}", stage, ContextStage::Visible);
        }
    }

    /// Safety-net pass: re-inject and make sure the context is visible
    async fn reassert(&self, context: &dyn RenderingContext, rules: &RuleSet) {
        let report = self.injector.inject(context, rules).await;
        log::debug!("re-assert pass: {:?}", report.outcome);
        if self.is_destroyed() {
            return;
        }
        self.gate.reveal(context).await;
    }

    async fn restyle_all(&self) {
        let (theme, font) = self.snapshot();
        let rules = self.registry.generate_rule_set(theme, font, self.device);
        for context in self.host.mounted_contexts() {
            if self.is_destroyed() {
                return;
            }
            self.style_context(context.as_ref(), &rules).await;
        }
    }

    fn notify_observers(&self) {
        let callbacks: Vec<ObserverFn> = self
            .observers
            .lock()
            .map(|list| list.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();
        for callback in callbacks {
            callback();
        }
    }
}
