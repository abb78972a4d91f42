//! Weighted spam rule table and override signatures.
//!
//! Rules are configuration data, not hidden constants: a [`RuleSet`] can be
//! built from any rule list, and the built-in table is inspectable through
//! [`RuleSet::rules`].

use regex::Regex;

/// A single weighted spam detection rule.
#[derive(Debug, Clone)]
pub struct SpamRule {
    /// Stable identifier, reported in verdicts for auditability.
    pub id: &'static str,
    /// Pattern tested against normalized text.
    pub pattern: Regex,
    /// Score contribution in `(0, 1]` when the pattern matches.
    pub weight: f64,
}

impl SpamRule {
    /// Create a rule from a pattern string.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex.
    pub fn new(id: &'static str, pattern: &str, weight: f64) -> Result<Self, regex::Error> {
        Ok(Self {
            id,
            pattern: Regex::new(pattern)?,
            weight,
        })
    }
}

/// A pattern whose match forces a spam verdict irrespective of blended score.
#[derive(Debug, Clone)]
pub struct OverrideSignature {
    /// Stable identifier.
    pub id: &'static str,
    /// Pattern tested against the raw (pre-normalization) text.
    pub pattern: Regex,
}

impl OverrideSignature {
    /// Create an override signature from a pattern string.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is not a valid regex.
    pub fn new(id: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            id,
            pattern: Regex::new(pattern)?,
        })
    }
}

/// An ordered table of weighted spam rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<SpamRule>,
}

impl RuleSet {
    /// Create a rule set from an explicit rule list.
    #[must_use]
    pub const fn new(rules: Vec<SpamRule>) -> Self {
        Self { rules }
    }

    /// The rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[SpamRule] {
        &self.rules
    }

    /// The built-in rule table.
    ///
    /// Weights are calibrated so that a single strong signal stays below the
    /// 0.8 spam cutoff while any two signals cross it.
    #[must_use]
    #[allow(clippy::expect_used)] // static patterns, exercised by tests
    pub fn builtin() -> Self {
        let rule = |id, pattern, weight| {
            SpamRule::new(id, pattern, weight).expect("built-in rule pattern")
        };
        Self::new(vec![
            rule("prize", r"(?i)(win(ners?|ning)|prize|reward|bonus)", 0.95),
            rule("currency-amount", r"(?i)[$€£₹]\s*\d+", 0.9),
            rule(
                "free-offer",
                r"(?i)(free|discount|offer|deal)\s*(entry|gift|money|trial|shipping)?",
                0.85,
            ),
            rule(
                "urgency",
                r"(?i)(urgent|immediate|action required|quick|last chance)",
                0.9,
            ),
            rule(
                "limited-time",
                r"(?i)(limited time|offer expires|only today)",
                0.8,
            ),
            rule(
                "account-security",
                r"(?i)(account (verif|susp|locked|limit)|security alert)",
                0.95,
            ),
            rule(
                "verify-details",
                r"(?i)(verify|confirm|update)\s*(your|my|account|details)",
                0.9,
            ),
            rule(
                "brand-alert",
                r"(?i)(google|paypal|amazon|ebay|bank|apple)\s*(alert|notice|warning)",
                0.92,
            ),
            rule(
                "click-here",
                r"(?i)(click|tap|press)\s*(here|below|link|button)",
                0.85,
            ),
            rule(
                "url",
                r"(?i)https?://\S+|bit\.ly|goo\.gl|tinyurl",
                0.8,
            ),
            rule(
                "congratulations",
                r"(?i)(congratulations|you have been selected|exclusive offer)",
                0.8,
            ),
            rule(
                "claim-your",
                r"(?i)(claim your|don't miss|special for you)",
                0.75,
            ),
            rule(
                "inheritance",
                r"(?i)(nigeria|prince|royalty|inheritance)",
                0.95,
            ),
            rule("leet-free", r"(?i)fr[3e]{2}", 0.85),
            rule("you-won", r"(?i)you (won|have won)", 0.9),
            rule(
                "big-number-currency",
                r"(?i)(million|thousand|hundred)\s*(dollars|pounds|euros)",
                0.85,
            ),
            rule("brand-obfuscation", r"(?i)g[o0]{2}gle|paypa[l1]", 0.85),
            rule("urgent", r"(?i)urgent", 0.85),
        ])
    }

    /// The built-in override signatures: unambiguous spam phrasings that
    /// force a spam verdict regardless of blended score.
    #[must_use]
    #[allow(clippy::expect_used)] // static patterns, exercised by tests
    pub fn builtin_overrides() -> Vec<OverrideSignature> {
        let sig = |id, pattern| {
            OverrideSignature::new(id, pattern).expect("built-in override pattern")
        };
        vec![
            sig("inheritance-scam", r"(?i)nigeria.*prince"),
            sig("leet-free-offer", r"(?i)fr[3e]{2}.*offer"),
            sig("you-won", r"(?i)you (won|have won)"),
            sig(
                "big-money",
                r"(?i)(million|thousand).*(dollar|pound|euro)",
            ),
            sig("account-verification", r"(?i)account.*verif"),
            sig("click-here", r"(?i)click.*here"),
        ]
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::builtin()
    }
}
