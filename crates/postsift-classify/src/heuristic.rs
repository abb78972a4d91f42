//! Deterministic rule-based scorer.

use crate::label::Label;
use crate::rules::RuleSet;

/// Raw score at or above which the heuristic labels text as spam.
pub const SPAM_CUTOFF: f64 = 0.8;

/// Amplification applied when more than two rules match: several
/// independent signals in one message are stronger evidence than their sum.
const MULTI_SIGNAL_FACTOR: f64 = 1.3;

/// Confidence ceiling; the heuristic never claims certainty.
const CONFIDENCE_CAP: f64 = 0.99;

/// Output of the heuristic scorer.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicVerdict {
    /// Spam or ham.
    pub label: Label,
    /// Capped confidence in `[0, 0.99]`.
    pub confidence: f64,
    /// Amplified sum of matched rule weights, uncapped.
    pub raw_score: f64,
    /// Identifiers of the rules that matched, in table order.
    pub matched: Vec<&'static str>,
}

/// Scores normalized text against a weighted rule table.
///
/// Pure and deterministic: no I/O, no shared mutable state, safe to call
/// concurrently for distinct inputs.
#[derive(Debug, Clone)]
pub struct HeuristicScorer {
    rules: RuleSet,
}

impl HeuristicScorer {
    /// Create a scorer over the given rule table.
    #[must_use]
    pub const fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// The rule table this scorer evaluates.
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Score normalized text.
    ///
    /// Sums the weights of all matching rules, amplifies by ×1.3 when more
    /// than two rules match, and labels spam at a raw score of 0.8 or above.
    /// Text matching no rule (including empty text) yields ham at zero
    /// confidence.
    #[must_use]
    pub fn score(&self, normalized: &str) -> HeuristicVerdict {
        let mut raw_score = 0.0;
        let mut matched = Vec::new();

        for rule in self.rules.rules() {
            if rule.pattern.is_match(normalized) {
                raw_score += rule.weight;
                matched.push(rule.id);
            }
        }

        if matched.len() > 2 {
            raw_score *= MULTI_SIGNAL_FACTOR;
        }

        let label = if raw_score >= SPAM_CUTOFF {
            Label::Spam
        } else {
            Label::Ham
        };

        HeuristicVerdict {
            label,
            confidence: raw_score.min(CONFIDENCE_CAP),
            raw_score,
            matched,
        }
    }
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new(RuleSet::builtin())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn test_empty_text_is_ham_at_zero() {
        let scorer = HeuristicScorer::default();
        let verdict = scorer.score("");
        assert_eq!(verdict.label, Label::Ham);
        assert!((verdict.confidence - 0.0).abs() < f64::EPSILON);
        assert!(verdict.matched.is_empty());
    }

    #[test]
    fn test_benign_text_matches_nothing() {
        let scorer = HeuristicScorer::default();
        let verdict = scorer.score(&normalize(
            "Hey, are we still meeting for lunch tomorrow at 1pm?",
        ));
        assert_eq!(verdict.label, Label::Ham);
        assert!(verdict.matched.is_empty());
    }

    #[test]
    fn test_prize_url_click_combination_is_spam() {
        let scorer = HeuristicScorer::default();
        let verdict = scorer.score(&normalize(
            "Congratulations! You've won a brand new iPhone 15. Click here: http://prizes.example",
        ));
        assert!(verdict.matched.len() >= 3, "matched: {:?}", verdict.matched);
        assert!(verdict.raw_score >= SPAM_CUTOFF);
        assert_eq!(verdict.label, Label::Spam);
        assert!(verdict.confidence <= 0.99);
    }

    #[test]
    fn test_multi_signal_amplification() {
        let rules = RuleSet::new(vec![
            crate::rules::SpamRule::new("a", "aaa", 0.2).unwrap(),
            crate::rules::SpamRule::new("b", "bbb", 0.2).unwrap(),
            crate::rules::SpamRule::new("c", "ccc", 0.2).unwrap(),
        ]);
        let scorer = HeuristicScorer::new(rules);

        let two = scorer.score("aaa bbb");
        assert!((two.raw_score - 0.4).abs() < 1e-9);

        let three = scorer.score("aaa bbb ccc");
        assert!((three.raw_score - 0.6 * 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_capped() {
        let scorer = HeuristicScorer::default();
        let verdict = scorer.score(&normalize(
            "URGENT winner! Free offer expires today, verify your account, \
             click here http://x.example to claim your $1000000 prize from a Nigerian prince",
        ));
        assert_eq!(verdict.label, Label::Spam);
        assert!((verdict.confidence - 0.99).abs() < f64::EPSILON);
        assert!(verdict.raw_score > 0.99);
    }

    #[test]
    fn test_monotone_in_matching_rules() {
        let scorer = HeuristicScorer::default();
        let base = scorer.score("nothing to see");
        let one = scorer.score("nothing to see, claim your gift");
        let more = scorer.score("nothing to see, claim your gift, urgent prize");
        assert!(one.raw_score >= base.raw_score);
        assert!(more.raw_score >= one.raw_score);
    }
}
