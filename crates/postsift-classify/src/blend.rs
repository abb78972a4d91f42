//! Blends the heuristic and remote signals into one verdict.

use tracing::debug;

use crate::heuristic::{HeuristicScorer, HeuristicVerdict};
use crate::label::Label;
use crate::normalize::normalize;
use crate::remote::{HttpRemoteScorer, RemoteSignal, RemoteVerdict};
use crate::rules::{OverrideSignature, RuleSet};

/// Classification configuration: rule table, override signatures, and the
/// blending weights and thresholds.
///
/// A plain value passed in at construction; there is no process-wide
/// classifier instance.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Weighted rule table for the heuristic scorer.
    pub rules: RuleSet,
    /// Unambiguous-spam signatures checked against the raw text.
    pub overrides: Vec<OverrideSignature>,
    /// Blended score at or above which the verdict is spam.
    pub spam_threshold: f64,
    /// Share of the blended score carried by the heuristic signal.
    pub heuristic_share: f64,
    /// Share of the blended score carried by the remote signal.
    pub remote_share: f64,
    /// Amplification (and cap) applied to a spam-labelled heuristic
    /// confidence before blending.
    pub heuristic_boost: f64,
    /// Damping applied to a spam-labelled remote confidence before blending.
    pub remote_damping: f64,
    /// Minimum confidence reported for an overridden verdict.
    pub override_floor: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rules: RuleSet::builtin(),
            overrides: RuleSet::builtin_overrides(),
            spam_threshold: 0.65,
            heuristic_share: 0.7,
            remote_share: 0.3,
            heuristic_boost: 1.5,
            remote_damping: 0.8,
            override_floor: 0.95,
        }
    }
}

/// The raw sub-results and intermediate weights behind a verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributingSignals {
    /// Heuristic scorer output.
    pub heuristic: HeuristicVerdict,
    /// Remote scorer output, `None` when the signal was unavailable.
    pub remote: Option<RemoteVerdict>,
    /// Heuristic contribution before the share multiplier.
    pub heuristic_weight: f64,
    /// Remote contribution before the share multiplier.
    pub remote_weight: f64,
    /// The blended score compared against the spam threshold.
    pub blended: f64,
}

/// Final classification verdict for one message body.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Spam or ham.
    pub label: Label,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Whether an override signature forced the label.
    pub overridden: bool,
    /// Identifier of the matched override signature, if any.
    pub matched_override: Option<&'static str>,
    /// Raw sub-results for auditability.
    pub signals: ContributingSignals,
}

impl Verdict {
    /// Human-readable description of how the verdict was produced.
    #[must_use]
    pub fn source(&self) -> String {
        format!(
            "hybrid(heuristic={:.2}, remote={:.2})",
            self.signals.heuristic_weight, self.signals.remote_weight
        )
    }
}

/// Hybrid classifier: deterministic heuristic scoring blended with an
/// optional remote inference signal plus deterministic override rules.
///
/// [`Classifier::classify`] never fails; a missing or broken remote signal
/// silently reduces to heuristic-only scoring.
#[derive(Debug, Clone)]
pub struct Classifier<R = HttpRemoteScorer> {
    heuristic: HeuristicScorer,
    overrides: Vec<OverrideSignature>,
    spam_threshold: f64,
    heuristic_share: f64,
    remote_share: f64,
    heuristic_boost: f64,
    remote_damping: f64,
    override_floor: f64,
    remote: Option<R>,
}

impl Classifier<HttpRemoteScorer> {
    /// Create a classifier with no remote signal.
    #[must_use]
    pub fn heuristic_only(config: ClassifierConfig) -> Self {
        Self::build(config, None)
    }
}

impl Default for Classifier<HttpRemoteScorer> {
    fn default() -> Self {
        Self::heuristic_only(ClassifierConfig::default())
    }
}

impl<R: RemoteSignal> Classifier<R> {
    /// Create a classifier that blends in the given remote signal.
    #[must_use]
    pub fn with_signal(config: ClassifierConfig, remote: R) -> Self {
        Self::build(config, Some(remote))
    }

    fn build(config: ClassifierConfig, remote: Option<R>) -> Self {
        Self {
            heuristic: HeuristicScorer::new(config.rules),
            overrides: config.overrides,
            spam_threshold: config.spam_threshold,
            heuristic_share: config.heuristic_share,
            remote_share: config.remote_share,
            heuristic_boost: config.heuristic_boost,
            remote_damping: config.remote_damping,
            override_floor: config.override_floor,
            remote,
        }
    }

    /// Classify raw text.
    ///
    /// Normalizes, runs the heuristic and remote scorers concurrently,
    /// blends their spam-weighted confidences, and finally applies the
    /// override signatures against the raw text. Total: never fails.
    pub async fn classify(&self, raw_text: &str) -> Verdict {
        let normalized = normalize(raw_text);

        let heuristic_task = async { self.heuristic.score(&normalized) };
        let remote_task = async {
            match &self.remote {
                Some(remote) => remote.try_score(&normalized).await,
                None => None,
            }
        };
        let (heuristic, remote) = tokio::join!(heuristic_task, remote_task);

        let heuristic_weight = if heuristic.label.is_spam() {
            (heuristic.confidence * self.heuristic_boost).min(self.heuristic_boost)
        } else {
            0.0
        };
        let remote_weight = remote
            .filter(|r| r.label.is_spam())
            .map_or(0.0, |r| r.confidence * self.remote_damping);

        let blended = heuristic_weight * self.heuristic_share + remote_weight * self.remote_share;

        let label = if blended >= self.spam_threshold {
            Label::Spam
        } else {
            Label::Ham
        };
        let confidence = heuristic
            .confidence
            .max(remote.map_or(0.0, |r| r.confidence));

        let mut verdict = Verdict {
            label,
            confidence,
            overridden: false,
            matched_override: None,
            signals: ContributingSignals {
                heuristic,
                remote,
                heuristic_weight,
                remote_weight,
                blended,
            },
        };

        if let Some(signature) = self
            .overrides
            .iter()
            .find(|s| s.pattern.is_match(raw_text))
        {
            verdict.label = Label::Spam;
            verdict.confidence = verdict.confidence.max(self.override_floor);
            verdict.overridden = true;
            verdict.matched_override = Some(signature.id);
        }

        debug!(
            label = %verdict.label,
            confidence = verdict.confidence,
            overridden = verdict.overridden,
            blended,
            "classified message body"
        );
        verdict
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Remote signal stub returning a fixed answer.
    #[derive(Debug, Clone, Copy)]
    struct StubRemote(Option<RemoteVerdict>);

    impl RemoteSignal for StubRemote {
        async fn try_score(&self, _text: &str) -> Option<RemoteVerdict> {
            self.0
        }
    }

    const SPAM_TEXT: &str =
        "Congratulations! You've been selected for an exclusive offer. \
         Click the link below: http://deals.example";
    const HAM_TEXT: &str = "Hey, are we still meeting for lunch tomorrow at 1pm?";

    #[tokio::test]
    async fn test_ham_text_with_no_signals() {
        let classifier = Classifier::default();
        let verdict = classifier.classify(HAM_TEXT).await;
        assert_eq!(verdict.label, Label::Ham);
        assert!(!verdict.overridden);
        assert!(verdict.signals.heuristic.matched.is_empty());
        assert!((verdict.signals.blended - 0.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_spam_text_heuristic_only() {
        let classifier = Classifier::default();
        let verdict = classifier.classify(SPAM_TEXT).await;
        assert_eq!(verdict.label, Label::Spam);
        // heuristic-only: blended = min(1.5, conf * 1.5) * 0.7
        let expected =
            (verdict.signals.heuristic.confidence * 1.5).min(1.5) * 0.7;
        assert!((verdict.signals.blended - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_deterministic_for_fixed_remote_response() {
        let remote = StubRemote(Some(RemoteVerdict {
            label: Label::Spam,
            confidence: 0.9,
        }));
        let classifier = Classifier::with_signal(ClassifierConfig::default(), remote);
        let first = classifier.classify(SPAM_TEXT).await;
        let second = classifier.classify(SPAM_TEXT).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unavailable_remote_degrades_to_heuristic_only() {
        let config = ClassifierConfig::default();
        let with_dead_remote =
            Classifier::with_signal(config.clone(), StubRemote(None));
        let heuristic_only = Classifier::heuristic_only(config);

        for text in [SPAM_TEXT, HAM_TEXT, ""] {
            let degraded = with_dead_remote.classify(text).await;
            let baseline = heuristic_only.classify(text).await;
            assert_eq!(degraded, baseline);
            assert!((degraded.signals.remote_weight - 0.0).abs() < f64::EPSILON);
        }
    }

    #[tokio::test]
    async fn test_remote_signal_contributes_to_blend() {
        let remote = StubRemote(Some(RemoteVerdict {
            label: Label::Spam,
            confidence: 0.9,
        }));
        let classifier = Classifier::with_signal(ClassifierConfig::default(), remote);
        let verdict = classifier.classify(SPAM_TEXT).await;

        assert!((verdict.signals.remote_weight - 0.9 * 0.8).abs() < 1e-9);
        let expected = verdict.signals.heuristic_weight * 0.7 + 0.9 * 0.8 * 0.3;
        assert!((verdict.signals.blended - expected).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_remote_alone_cannot_cross_threshold() {
        // remote cap: 1.0 * 0.8 * 0.3 = 0.24, well under 0.65
        let remote = StubRemote(Some(RemoteVerdict {
            label: Label::Spam,
            confidence: 1.0,
        }));
        let classifier = Classifier::with_signal(ClassifierConfig::default(), remote);
        let verdict = classifier.classify(HAM_TEXT).await;
        assert_eq!(verdict.label, Label::Ham);
        assert!(verdict.signals.blended < 0.65);
    }

    #[tokio::test]
    async fn test_ham_remote_contributes_nothing() {
        let remote = StubRemote(Some(RemoteVerdict {
            label: Label::Ham,
            confidence: 0.99,
        }));
        let classifier = Classifier::with_signal(ClassifierConfig::default(), remote);
        let verdict = classifier.classify(HAM_TEXT).await;
        assert!((verdict.signals.remote_weight - 0.0).abs() < f64::EPSILON);
        // ...but its confidence still feeds the reported confidence.
        assert!((verdict.confidence - 0.99).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_override_supremacy_beats_confident_ham_remote() {
        let remote = StubRemote(Some(RemoteVerdict {
            label: Label::Ham,
            confidence: 0.99,
        }));
        let classifier = Classifier::with_signal(ClassifierConfig::default(), remote);
        // No heuristic rule fires, but the click-here signature does.
        let verdict = classifier.classify("Just click anywhere here when ready").await;

        assert_eq!(verdict.label, Label::Spam);
        assert!(verdict.confidence >= 0.95);
        assert!(verdict.overridden);
        assert_eq!(verdict.matched_override, Some("click-here"));
    }

    #[tokio::test]
    async fn test_override_matches_raw_text_before_normalization() {
        let classifier = Classifier::default();
        // Punctuation collapse rewrites "here..." in normalized text; the
        // override set still sees the raw phrasing.
        let verdict = classifier.classify("CLICK anywhere HERE").await;
        assert!(verdict.overridden);
        assert_eq!(verdict.label, Label::Spam);
    }

    #[tokio::test]
    async fn test_source_describes_weights() {
        let classifier = Classifier::default();
        let verdict = classifier.classify(HAM_TEXT).await;
        assert_eq!(verdict.source(), "hybrid(heuristic=0.00, remote=0.00)");
    }
}
