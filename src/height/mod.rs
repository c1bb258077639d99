//! Container height synchronization for continuous-scroll layouts
//!
//! After render, relocation, and layout events each context's hosting
//! element is resized to the content's intrinsic height so the scroll
//! column neither clips nor overscrolls. Measurement waits two frame
//! boundaries for fonts and content to settle. A failed or non-positive
//! measurement is skipped and the previous height stays in place.

use crate::defaults::SETTLE_FRAMES;
use crate::engine::{FrameScheduler, RendererHost, RenderingContext};
use crate::utils::{LecternError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Measures and applies container heights; never propagates errors
pub struct HeightAdjuster {
    scheduler: Arc<dyn FrameScheduler>,
    destroyed: Arc<AtomicBool>,
}

impl HeightAdjuster {
    pub fn new(scheduler: Arc<dyn FrameScheduler>, destroyed: Arc<AtomicBool>) -> Self {
        Self {
            scheduler,
            destroyed,
        }
    }

    /// Measure one context after the settle wait and resize its container.
    /// Returns the applied height, `None` when the measurement was skipped.
    pub async fn adjust_height(&self, context: &dyn RenderingContext) -> Option<f64> {
        self.scheduler.settle(SETTLE_FRAMES).await;
        if self.destroyed.load(Ordering::SeqCst) {
            return None;
        }

        let height = match measure(context) {
            Ok(height) => height,
            Err(err) => {
                log::debug!("height: skipping context: {}", err);
                return None;
            }
        };

        if let Err(err) = context.set_container_height(height) {
            log::debug!("height: could not apply {}px: {}", height, err);
            return None;
        }
        Some(height)
    }

    /// Adjust every mounted context, then mark the outer scroll container
    /// height automatic so the column tracks its children.
    pub async fn adjust_all(&self, host: &dyn RendererHost) {
        for context in host.mounted_contexts() {
            if self.destroyed.load(Ordering::SeqCst) {
                return;
            }
            self.adjust_height(context.as_ref()).await;
        }
        if self.destroyed.load(Ordering::SeqCst) {
            return;
        }
        host.set_viewport_height_auto();
    }
}

/// Read a context's intrinsic height. A zero-height document means the
/// content has not laid out yet, so that is a measurement failure too.
fn measure(context: &dyn RenderingContext) -> Result<f64> {
    let height = context.content_metrics()?.intrinsic_height();
    if height <= 0.0 {
        return Err(LecternError::Measurement(format!(
            "non-positive height {}",
            height
        )));
    }
    Ok(height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ContentMetrics, ImmediateScheduler};
    use crate::theme::{Declaration, RuleSet};
    use crate::utils::{LecternError, Result};
    use futures::future::BoxFuture;
    use std::sync::Mutex;

    struct FakeContext {
        metrics: Result<ContentMetrics>,
        applied: Mutex<Option<f64>>,
    }

    impl FakeContext {
        fn with_metrics(metrics: ContentMetrics) -> Self {
            Self {
                metrics: Ok(metrics),
                applied: Mutex::new(None),
            }
        }
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

        fn set_hidden(&self, _hidden: bool) -> Result<()> {
            Ok(())
        }

        fn content_metrics(&self) -> Result<ContentMetrics> {
            match &self.metrics {
                Ok(metrics) => Ok(*metrics),
                Err(_) => Err(LecternError::ContextUnreachable("gone".to_string())),
            }
        }

        fn set_container_height(&self, px: f64) -> Result<()> {
            if let Ok(mut applied) = self.applied.lock() {
                *applied = Some(px);
            }
            Ok(())
        }
    }

    fn adjuster() -> HeightAdjuster {
        HeightAdjuster::new(
            Arc::new(ImmediateScheduler),
            Arc::new(AtomicBool::new(false)),
        )
    }

    #[tokio::test]
    async fn test_applies_max_of_measurements() {
        let context = FakeContext::with_metrics(ContentMetrics {
            scroll_height: 2400.0,
            offset_height: 1800.0,
            client_height: 900.0,
        });

        let applied = adjuster().adjust_height(&context).await;

        assert_eq!(applied, Some(2400.0));
        assert_eq!(*context.applied.lock().unwrap(), Some(2400.0));
    }

    #[test]
    fn test_empty_document_is_a_measurement_error() {
        let context = FakeContext::with_metrics(ContentMetrics::default());
        let err = measure(&context).unwrap_err();
        assert!(matches!(err, LecternError::Measurement(_)));
    }

    #[tokio::test]
    async fn test_skips_non_positive_measurement() {
        let context = FakeContext::with_metrics(ContentMetrics::default());

        let applied = adjuster().adjust_height(&context).await;

        assert_eq!(applied, None);
        assert_eq!(*context.applied.lock().unwrap(), None);
    }

    #[tokio::test]
    async fn test_skips_unreachable_context() {
        let context = FakeContext {
            metrics: Err(LecternError::ContextUnreachable("gone".to_string())),
            applied: Mutex::new(None),
        };

        let applied = adjuster().adjust_height(&context).await;

        assert_eq!(applied, None);
    }

    #[tokio::test]
    async fn test_no_resize_after_destroy() {
        let destroyed = Arc::new(AtomicBool::new(true));
        let adjuster =
            HeightAdjuster::new(Arc::new(ImmediateScheduler), Arc::clone(&destroyed));
        let context = FakeContext::with_metrics(ContentMetrics {
            scroll_height: 1000.0,
            ..Default::default()
        });

        let applied = adjuster.adjust_height(&context).await;

        assert_eq!(applied, None);
        assert_eq!(*context.applied.lock().unwrap(), None);
    }
}
