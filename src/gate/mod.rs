//! Flash-of-unstyled-content gating
//!
//! Mobile WebKit paints unstyled chapter content for a frame or two before
//! injected styles land, so mobile contexts are hidden on first encounter
//! and revealed only after injection settles. Desktop contexts are never
//! hidden; the defect does not reproduce there.
//!
//! The reveal path is unconditional: even when injection fails outright the
//! context is shown again, so content is never left permanently hidden.

use crate::defaults::SETTLE_FRAMES;
use crate::device::DeviceClass;
use crate::engine::{FrameScheduler, RenderingContext};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Hides a context before styling and reveals it after the settle wait
pub struct VisibilityGate {
    device: DeviceClass,
    scheduler: Arc<dyn FrameScheduler>,
    destroyed: Arc<AtomicBool>,
}

impl VisibilityGate {
    pub fn new(
        device: DeviceClass,
        scheduler: Arc<dyn FrameScheduler>,
        destroyed: Arc<AtomicBool>,
    ) -> Self {
        Self {
            device,
            scheduler,
            destroyed,
        }
    }

    /// Hide the context's root and body before injection begins. Mobile
    /// device classes only; no-op on desktop.
    pub fn prepare_hidden(&self, context: &dyn RenderingContext) {
        if !self.device.is_mobile() {
            return;
        }
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }
        if let Err(err) = context.set_hidden(true) {
            log::debug!("gate: could not hide context: {}", err);
        }
    }

    /// Make the context visible again. On mobile this first waits two
    /// animation-frame boundaries so the style/layout pass catches up; on
    /// desktop the context was never hidden and this un-hides immediately.
    pub async fn reveal(&self, context: &dyn RenderingContext) {
        if self.device.is_mobile() {
            self.scheduler.settle(SETTLE_FRAMES).await;
        }
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }
        if let Err(err) = context.set_hidden(false) {
            log::debug!("gate: could not reveal context: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ContentMetrics, ImmediateScheduler};
    use crate::theme::{Declaration, RuleSet};
    use crate::utils::Result;
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeContext {
        hidden_calls: Mutex<Vec<bool>>,
    }

    impl RenderingContext for FakeContext {
        fn add_stylesheet_rules(
            &self,
            _rules: &RuleSet,
        ) -> Option<BoxFuture<'static, Result<()>>> {
            None
        }

        fn insert_head_style(&self, _css_text: &str) -> Result<()> {
            Ok(())
        }

        fn style_root(&self, _declarations: &[Declaration]) -> Result<()> {
            Ok(())
        }

        fn style_body(&self, _declarations: &[Declaration]) -> Result<()> {
            Ok(())
        }

        fn style_anchors(&self, _declarations: &[Declaration]) -> Result<()> {
            Ok(())
        }

        fn set_hidden(&self, hidden: bool) -> Result<()> {
            if let Ok(mut calls) = self.hidden_calls.lock() {
                calls.push(hidden);
            }
            Ok(())
        }

        fn content_metrics(&self) -> Result<ContentMetrics> {
            Ok(ContentMetrics::default())
        }

        fn set_container_height(&self, _px: f64) -> Result<()> {
            Ok(())
        }
    }

    fn gate(device: DeviceClass) -> VisibilityGate {
        VisibilityGate::new(
            device,
            Arc::new(ImmediateScheduler),
            Arc::new(AtomicBool::new(false)),
        )
    }

    #[tokio::test]
    async fn test_desktop_never_hidden() {
        let context = FakeContext::default();
        let gate = gate(DeviceClass::Desktop);

        gate.prepare_hidden(&context);
        gate.reveal(&context).await;

        // No hide call; reveal still un-hides
        assert_eq!(*context.hidden_calls.lock().unwrap(), vec![false]);
    }

    #[tokio::test]
    async fn test_mobile_hide_then_reveal() {
        let context = FakeContext::default();
        let gate = gate(DeviceClass::MobileIos);

        gate.prepare_hidden(&context);
        gate.reveal(&context).await;

        assert_eq!(*context.hidden_calls.lock().unwrap(), vec![true, false]);
    }

    #[tokio::test]
    async fn test_no_reveal_after_destroy() {
        let context = FakeContext::default();
        let destroyed = Arc::new(AtomicBool::new(false));
        let gate = VisibilityGate::new(
            DeviceClass::MobileOther,
            Arc::new(ImmediateScheduler),
            Arc::clone(&destroyed),
        );

        gate.prepare_hidden(&context);
        destroyed.store(true, Ordering::SeqCst);
        gate.reveal(&context).await;

        // Destruction mid-flight: the reveal mutation never happens
        assert_eq!(*context.hidden_calls.lock().unwrap(), vec![true]);
    }
}
