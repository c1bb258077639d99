//! Ranked style-injection mechanisms
//!
//! A rule set reaches a rendering context through the first mechanism that
//! works: the engine's structured stylesheet-rule capability, a `<style>`
//! element inserted at the document head, or direct per-node style
//! assignment. Every attempt is independently error-wrapped; a failure is
//! logged at debug level and falls through to the next mechanism, and no
//! failure surfaces to the caller.
//!
//! Nothing is cached between calls: the engine can silently replace a
//! context's DOM, so every `inject` determines capability fresh.

use crate::engine::RenderingContext;
use crate::theme::{decl, Declaration, RuleSet, Value};
use crate::utils::{LecternError, Result};
use futures::future::BoxFuture;

/// The three mechanisms, in preference order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mechanism {
    /// Declarative rule insertion through the engine's own API
    StructuredRules,
    /// Serialized CSS in a `<style>` element first in the head
    HeadStyle,
    /// Direct property assignment on root/body/anchor nodes
    DirectStyles,
}

/// What one mechanism attempt produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Applied,
    /// The context does not expose this mechanism
    Unavailable,
    /// The mechanism raised an engine-internal error
    Failed,
    /// The context became unreachable; the whole pass stops
    ContextLost,
}

/// Ephemeral record of one attempt; used for fallthrough and debug logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionAttempt {
    pub mechanism: Mechanism,
    pub outcome: AttemptOutcome,
}

/// Final disposition of one `inject` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionOutcome {
    /// This mechanism satisfied the call
    Styled(Mechanism),
    /// All mechanisms failed; the context is left unstyled but visible
    Unstyled,
    /// The context went away mid-pass; silently terminal
    Abandoned,
}

/// Per-call result. Never cached across calls.
#[derive(Debug, Clone)]
pub struct InjectionReport {
    pub outcome: InjectionOutcome,
    pub attempts: Vec<InjectionAttempt>,
}

impl InjectionReport {
    /// True when some mechanism applied the rules
    pub fn styled(&self) -> bool {
        matches!(self.outcome, InjectionOutcome::Styled(_))
    }
}

/// Uniform interface over one injection strategy, so each can be tested in
/// isolation against a fake context
pub trait InjectionMechanism: Send + Sync {
    fn id(&self) -> Mechanism;

    fn attempt<'a>(
        &'a self,
        context: &'a dyn RenderingContext,
        rules: &'a RuleSet,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Preferred: the engine's structured "add stylesheet rules" capability
pub struct StructuredRulesMechanism;

impl InjectionMechanism for StructuredRulesMechanism {
    fn id(&self) -> Mechanism {
        Mechanism::StructuredRules
    }

    fn attempt<'a>(
        &'a self,
        context: &'a dyn RenderingContext,
        rules: &'a RuleSet,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            match context.add_stylesheet_rules(rules) {
                Some(completion) => completion.await,
                None => Err(LecternError::MechanismUnavailable),
            }
        })
    }
}

/// Secondary: serialized CSS text inserted at the document head
pub struct HeadStyleMechanism;

impl InjectionMechanism for HeadStyleMechanism {
    fn id(&self) -> Mechanism {
        Mechanism::HeadStyle
    }

    fn attempt<'a>(
        &'a self,
        context: &'a dyn RenderingContext,
        rules: &'a RuleSet,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let css = rules.to_css_string();
            if css.is_empty() {
                return Err(LecternError::MechanismFailed(
                    "empty rule set".to_string(),
                ));
            }
            context.insert_head_style(&css)
        })
    }
}

/// Tertiary: direct property assignment of the minimal readability subset
/// (background and foreground on root/body, plain-text links) when neither
/// structured nor markup injection is reachable
pub struct DirectStylesMechanism;

impl DirectStylesMechanism {
    /// Pull the minimal subset out of the full rule set. The body rule is
    /// authoritative; the html rule is the fallback.
    fn minimal_subset(rules: &RuleSet) -> Option<(Vec<Declaration>, Vec<Declaration>)> {
        let base = rules.find("body").or_else(|| rules.find("html"))?;
        let background = base.value_of("background-color")?.clone();
        let foreground = base.value_of("color")?.clone();

        let root = vec![
            decl("background-color", background.clone()),
            decl("color", foreground.clone()),
        ];
        let mut body = vec![
            decl("background-color", background),
            decl("color", foreground),
        ];
        if let Some(font_size) = base.value_of("font-size") {
            body.push(decl("font-size", font_size.clone()));
        }
        Some((root, body))
    }

    fn anchor_subset() -> Vec<Declaration> {
        vec![
            decl("color", Value::keyword("inherit")),
            decl("text-decoration", Value::keyword("none")),
            decl("cursor", Value::keyword("default")),
        ]
    }
}

impl InjectionMechanism for DirectStylesMechanism {
    fn id(&self) -> Mechanism {
        Mechanism::DirectStyles
    }

    fn attempt<'a>(
        &'a self,
        context: &'a dyn RenderingContext,
        rules: &'a RuleSet,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let (root, body) = Self::minimal_subset(rules).ok_or_else(|| {
                LecternError::MechanismFailed("rule set has no base colors".to_string())
            })?;
            context.style_root(&root)?;
            context.style_body(&body)?;
            context.style_anchors(&Self::anchor_subset())?;
            Ok(())
        })
    }
}

/// Applies a rule set to one context through the ranked mechanism list
pub struct ContentInjector {
    mechanisms: Vec<Box<dyn InjectionMechanism>>,
}

impl ContentInjector {
    /// Injector with the standard mechanism ranking
    pub fn new() -> Self {
        Self::with_mechanisms(vec![
            Box::new(StructuredRulesMechanism),
            Box::new(HeadStyleMechanism),
            Box::new(DirectStylesMechanism),
        ])
    }

    /// Injector with a custom mechanism list, for tests and constrained
    /// hosts
    pub fn with_mechanisms(mechanisms: Vec<Box<dyn InjectionMechanism>>) -> Self {
        Self { mechanisms }
    }

    /// Try each mechanism in order until one applies. Never returns an
    /// error; worst case is an `Unstyled` (or `Abandoned`) report.
    pub async fn inject(
        &self,
        context: &dyn RenderingContext,
        rules: &RuleSet,
    ) -> InjectionReport {
        let mut attempts = Vec::with_capacity(self.mechanisms.len());

        for mechanism in &self.mechanisms {
            let id = mechanism.id();
            match mechanism.attempt(context, rules).await {
                Ok(()) => {
                    attempts.push(InjectionAttempt {
                        mechanism: id,
                        outcome: AttemptOutcome::Applied,
                    });
                    return InjectionReport {
                        outcome: InjectionOutcome::Styled(id),
                        attempts,
                    };
                }
                Err(err) if err.is_unreachable() => {
                    log::debug!("inject: context lost during {:?}: {}", id, err);
                    attempts.push(InjectionAttempt {
                        mechanism: id,
                        outcome: AttemptOutcome::ContextLost,
                    });
                    return InjectionReport {
                        outcome: InjectionOutcome::Abandoned,
                        attempts,
                    };
                }
                Err(LecternError::MechanismUnavailable) => {
                    log::debug!("inject: {:?} unavailable, falling through", id);
                    attempts.push(InjectionAttempt {
                        mechanism: id,
                        outcome: AttemptOutcome::Unavailable,
                    });
                }
                Err(err) => {
                    log::debug!("inject: {:?} failed: {}, falling through", id, err);
                    attempts.push(InjectionAttempt {
                        mechanism: id,
                        outcome: AttemptOutcome::Failed,
                    });
                }
            }
        }

        InjectionReport {
            outcome: InjectionOutcome::Unstyled,
            attempts,
        }
    }
}

impl Default for ContentInjector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ContentMetrics;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Fake context with per-mechanism failure switches
    #[derive(Default)]
    struct FakeContext {
        structured_supported: bool,
        structured_fails: bool,
        head_fails: bool,
        unreachable: AtomicBool,
        structured_applied: Mutex<Vec<usize>>,
        head_css: Mutex<Vec<String>>,
        direct_body: Mutex<Vec<Declaration>>,
        direct_anchors: Mutex<Vec<Declaration>>,
    }

    impl FakeContext {
        fn check_reachable(&self) -> Result<()> {
            if self.unreachable.load(Ordering::SeqCst) {
                Err(LecternError::ContextUnreachable("gone".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl RenderingContext for FakeContext {
        fn add_stylesheet_rules(
            &self,
            rules: &RuleSet,
        ) -> Option<BoxFuture<'static, Result<()>>> {
            if !self.structured_supported {
                return None;
            }
            if self.check_reachable().is_err() {
                return Some(Box::pin(futures::future::ready(Err(
                    LecternError::ContextUnreachable("gone".to_string()),
                ))));
            }
            if self.structured_fails {
                return Some(Box::pin(futures::future::ready(Err(
                    LecternError::MechanismFailed("engine rejected rules".to_string()),
                ))));
            }
            if let Ok(mut applied) = self.structured_applied.lock() {
                applied.push(rules.len());
            }
            Some(Box::pin(futures::future::ready(Ok(()))))
        }

        fn insert_head_style(&self, css_text: &str) -> Result<()> {
            self.check_reachable()?;
            if self.head_fails {
                return Err(LecternError::MechanismFailed(
                    "head not writable".to_string(),
                ));
            }
            if let Ok(mut head) = self.head_css.lock() {
                head.push(css_text.to_string());
            }
            Ok(())
        }

        fn style_root(&self, _declarations: &[Declaration]) -> Result<()> {
            self.check_reachable()
        }

        fn style_body(&self, declarations: &[Declaration]) -> Result<()> {
            self.check_reachable()?;
            if let Ok(mut body) = self.direct_body.lock() {
                body.extend_from_slice(declarations);
            }
            Ok(())
        }

        fn style_anchors(&self, declarations: &[Declaration]) -> Result<()> {
            self.check_reachable()?;
            if let Ok(mut anchors) = self.direct_anchors.lock() {
                anchors.extend_from_slice(declarations);
            }
            Ok(())
        }

        fn set_hidden(&self, _hidden: bool) -> Result<()> {
            self.check_reachable()
        }

        fn content_metrics(&self) -> Result<ContentMetrics> {
            self.check_reachable()?;
            Ok(ContentMetrics::default())
        }

        fn set_container_height(&self, _px: f64) -> Result<()> {
            self.check_reachable()
        }
    }

    fn sample_rules() -> RuleSet {
        let mut set = RuleSet::new();
        set.push(
            "body",
            vec![
                decl("background-color", Value::Raw("#ffffff".to_string())),
                decl("color", Value::Raw("#1c1b1a".to_string())),
                decl("font-size", Value::px(17.0)),
            ],
        );
        set
    }

    #[tokio::test]
    async fn test_structured_preferred() {
        let context = FakeContext {
            structured_supported: true,
            ..Default::default()
        };
        let report = ContentInjector::new()
            .inject(&context, &sample_rules())
            .await;

        assert_eq!(
            report.outcome,
            InjectionOutcome::Styled(Mechanism::StructuredRules)
        );
        assert_eq!(report.attempts.len(), 1);
        assert_eq!(context.structured_applied.lock().unwrap().len(), 1);
        assert!(context.head_css.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_falls_to_head_style_when_structured_absent() {
        let context = FakeContext::default();
        let report = ContentInjector::new()
            .inject(&context, &sample_rules())
            .await;

        assert_eq!(report.outcome, InjectionOutcome::Styled(Mechanism::HeadStyle));
        assert_eq!(
            report.attempts[0].outcome,
            AttemptOutcome::Unavailable
        );
        let head = context.head_css.lock().unwrap();
        assert_eq!(head.len(), 1);
        assert!(head[0].contains("background-color: #ffffff"));
    }

    #[tokio::test]
    async fn test_falls_to_direct_when_both_fail() {
        let context = FakeContext {
            structured_supported: true,
            structured_fails: true,
            head_fails: true,
            ..Default::default()
        };
        let report = ContentInjector::new()
            .inject(&context, &sample_rules())
            .await;

        assert_eq!(
            report.outcome,
            InjectionOutcome::Styled(Mechanism::DirectStyles)
        );
        assert_eq!(report.attempts.len(), 3);
        let body = context.direct_body.lock().unwrap();
        assert!(body.iter().any(|d| d.property == "background-color"));
        let anchors = context.direct_anchors.lock().unwrap();
        assert!(anchors.iter().any(|d| d.property == "text-decoration"));
    }

    #[tokio::test]
    async fn test_all_mechanisms_fail_is_unstyled_not_error() {
        let context = FakeContext {
            structured_supported: true,
            structured_fails: true,
            head_fails: true,
            ..Default::default()
        };
        // Direct styling has nothing to extract from an empty rule set
        let report = ContentInjector::new()
            .inject(&context, &RuleSet::new())
            .await;

        assert_eq!(report.outcome, InjectionOutcome::Unstyled);
        assert!(!report.styled());
    }

    #[tokio::test]
    async fn test_unreachable_context_abandons_pass() {
        let context = FakeContext::default();
        context.unreachable.store(true, Ordering::SeqCst);

        let report = ContentInjector::new()
            .inject(&context, &sample_rules())
            .await;

        // Structured is absent, head style hits the dead context: stop
        assert_eq!(report.outcome, InjectionOutcome::Abandoned);
        assert_eq!(
            report.attempts.last().unwrap().outcome,
            AttemptOutcome::ContextLost
        );
    }

    #[tokio::test]
    async fn test_inject_is_idempotent() {
        let context = FakeContext::default();
        let injector = ContentInjector::new();
        let rules = sample_rules();

        let first = injector.inject(&context, &rules).await;
        let second = injector.inject(&context, &rules).await;

        assert_eq!(first.outcome, second.outcome);
        // Determination runs fresh each call: two identical insertions
        let head = context.head_css.lock().unwrap();
        assert_eq!(head.len(), 2);
        assert_eq!(head[0], head[1]);
    }
}
