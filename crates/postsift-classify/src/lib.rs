//! # postsift-classify
//!
//! Hybrid spam classification engine for `PostSift`.
//!
//! This crate provides:
//! - Text normalization (leet-speak canonicalization, punctuation collapse)
//! - Heuristic scoring over an inspectable weighted rule table
//! - An optional remote inference signal with bounded timeout
//! - Deterministic blending of both signals with override signatures
//!
//! Classification never fails: a missing or broken remote signal degrades
//! to heuristic-only scoring.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod blend;
mod heuristic;
mod label;
mod normalize;
mod remote;
mod rules;

pub use blend::{Classifier, ClassifierConfig, ContributingSignals, Verdict};
pub use heuristic::{HeuristicScorer, HeuristicVerdict};
pub use label::Label;
pub use normalize::normalize;
pub use remote::{HttpRemoteScorer, RemoteScorerConfig, RemoteSignal, RemoteVerdict};
pub use rules::{OverrideSignature, RuleSet, SpamRule};
