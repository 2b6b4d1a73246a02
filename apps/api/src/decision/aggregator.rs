//! Decision Aggregator: combines three rater evaluations into HIRE / PASS / MAYBE.
//!
//! Pure and deterministic: identical inputs always yield an identical
//! `Decision` (no timestamps, no model calls). Algorithm:
//!
//! 1. Scores: missing evaluations read as 0 and are reported as data-quality issues.
//! 2. weighted = 0.4·technical + 0.3·culture + 0.3·business, full precision.
//! 3. Classification, first match wins:
//!    - weighted ≥ 7.5 and no critical red flag anywhere → HIRE
//!    - weighted < 6.0 or ≥ 2 raters raised any red flag → PASS
//!    - otherwise → MAYBE
//! 4. Confidence from the distance to the nearest threshold; any
//!    data-quality issue forces `low`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decision::conflict::{detect_conflict, RaterScores, SCORE_GAP_THRESHOLD};
use crate::decision::critical::CriticalFlagPolicy;
use crate::decision::negotiation::NegotiationResult;
use crate::evaluation::record::{PanelEvaluations, RaterRole, ScoreProvenance};

pub const TECHNICAL_WEIGHT: f64 = 0.4;
pub const CULTURE_WEIGHT: f64 = 0.3;
pub const BUSINESS_WEIGHT: f64 = 0.3;

pub const HIRE_THRESHOLD: f64 = 7.5;
pub const PASS_THRESHOLD: f64 = 6.0;
/// Number of raters with at least one red flag that forces a PASS.
pub const FLAGGED_RATERS_FOR_PASS: usize = 2;

/// Absorbs binary rounding in the weighted sum, so 0.4·6.3 + 0.3·8.1 + 0.3·8.5
/// lands on 7.5 rather than just under it.
pub const SCORE_EPSILON: f64 = 1e-9;

const LOW_CONFIDENCE_MARGIN: f64 = 0.5;
const MEDIUM_CONFIDENCE_MARGIN: f64 = 1.5;
const MAX_STRENGTH_FACTORS: usize = 3;

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalDecision {
    Hire,
    Pass,
    Maybe,
}

impl fmt::Display for FinalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalDecision::Hire => f.write_str("HIRE"),
            FinalDecision::Pass => f.write_str("PASS"),
            FinalDecision::Maybe => f.write_str("MAYBE"),
        }
    }
}

/// Advisory only; never used for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Conditions at the collaborator boundary that were absorbed rather than
/// failing the round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum DataQualityIssue {
    MissingEvaluation { role: RaterRole },
    DefaultedScore { role: RaterRole, reason: String },
    OutOfRangeScore { role: RaterRole, score: f64 },
    MalformedNegotiation { reason: String },
    NegotiationUnavailable { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub final_decision: FinalDecision,
    /// Reported with the precision used for the threshold checks.
    pub weighted_score: f64,
    pub confidence: Confidence,
    pub critical_factors: Vec<String>,
    pub red_flags_summary: Vec<String>,
    pub score_gap: f64,
    pub conflict_detected: bool,
    pub negotiation_considered: bool,
    pub reasoning: String,
    pub next_steps: String,
    pub data_quality: Vec<DataQualityIssue>,
}

/// Everything the aggregator reads. `upstream_issues` are conditions the
/// pipeline already absorbed (rejected scores, failed negotiation).
#[derive(Debug, Clone, Copy)]
pub struct AggregationInput<'a> {
    pub evaluations: &'a PanelEvaluations,
    pub negotiation: Option<&'a NegotiationResult>,
    pub upstream_issues: &'a [DataQualityIssue],
}

/// Which classification rule fired. Drives the narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecisionRule {
    MeetsHireBar,
    BelowPassThreshold,
    MultipleFlaggedRaters(usize),
    CriticalFlagBlocksHire,
    Borderline,
}

// ────────────────────────────────────────────────────────────────────────────
// Core algorithm
// ────────────────────────────────────────────────────────────────────────────

pub fn weighted_score(scores: &RaterScores) -> f64 {
    TECHNICAL_WEIGHT * scores.technical
        + CULTURE_WEIGHT * scores.culture
        + BUSINESS_WEIGHT * scores.business
}

/// Applies the classification policy to already-computed signals.
pub fn classify(weighted: f64, critical_flag_present: bool, flagged_raters: usize) -> FinalDecision {
    classify_with_rule(weighted, critical_flag_present, flagged_raters).0
}

fn classify_with_rule(
    weighted: f64,
    critical_flag_present: bool,
    flagged_raters: usize,
) -> (FinalDecision, DecisionRule) {
    let meets_hire_bar = weighted + SCORE_EPSILON >= HIRE_THRESHOLD;
    if meets_hire_bar && !critical_flag_present {
        return (FinalDecision::Hire, DecisionRule::MeetsHireBar);
    }
    if weighted + SCORE_EPSILON < PASS_THRESHOLD {
        return (FinalDecision::Pass, DecisionRule::BelowPassThreshold);
    }
    if flagged_raters >= FLAGGED_RATERS_FOR_PASS {
        return (
            FinalDecision::Pass,
            DecisionRule::MultipleFlaggedRaters(flagged_raters),
        );
    }
    if meets_hire_bar {
        (FinalDecision::Maybe, DecisionRule::CriticalFlagBlocksHire)
    } else {
        (FinalDecision::Maybe, DecisionRule::Borderline)
    }
}

pub fn confidence_for(weighted: f64, has_data_quality_issues: bool) -> Confidence {
    if has_data_quality_issues {
        return Confidence::Low;
    }
    let margin = (weighted - HIRE_THRESHOLD)
        .abs()
        .min((weighted - PASS_THRESHOLD).abs());
    if margin < LOW_CONFIDENCE_MARGIN {
        Confidence::Low
    } else if margin < MEDIUM_CONFIDENCE_MARGIN {
        Confidence::Medium
    } else {
        Confidence::High
    }
}

/// Produces the decision for one evaluation round.
pub fn aggregate(input: AggregationInput<'_>, policy: &dyn CriticalFlagPolicy) -> Decision {
    let panel = input.evaluations;
    let scores = RaterScores::from_panel(panel);
    let weighted = weighted_score(&scores);
    let conflict = detect_conflict(&scores);

    let data_quality = collect_data_quality(panel, input.upstream_issues);

    let critical_flags: Vec<(RaterRole, &str)> = panel
        .iter()
        .flat_map(|e| e.red_flags.iter().map(move |f| (e.role, f.as_str())))
        .filter(|(_, flag)| policy.is_critical(flag))
        .collect();
    let flagged_raters = panel.iter().filter(|e| e.has_red_flags()).count();

    let (final_decision, rule) =
        classify_with_rule(weighted, !critical_flags.is_empty(), flagged_raters);
    let confidence = confidence_for(weighted, !data_quality.is_empty());

    let mut critical_factors: Vec<String> = critical_flags
        .iter()
        .map(|(role, flag)| format!("critical red flag ({role}): {flag}"))
        .collect();
    if conflict.conflict {
        critical_factors.push(format!(
            "rater disagreement: score gap {:.1} exceeds {SCORE_GAP_THRESHOLD}",
            conflict.gap
        ));
    }
    for role in panel.missing_roles() {
        critical_factors.push(format!("{role} evaluation missing; scored as 0"));
    }
    for evaluation in panel.iter().filter(|e| e.is_defaulted()) {
        critical_factors.push(format!("{} evaluation defaulted; scored as 0", evaluation.role));
    }
    if let Some(best) = panel
        .iter()
        .filter(|e| !e.is_defaulted())
        .max_by(|a, b| a.score.total_cmp(&b.score))
    {
        critical_factors.extend(
            best.strengths
                .iter()
                .take(MAX_STRENGTH_FACTORS)
                .map(|s| format!("{} strength: {s}", best.role)),
        );
    }

    let red_flags_summary = panel
        .iter()
        .flat_map(|e| e.red_flags.iter().map(move |f| format!("{}: {f}", e.role)))
        .collect();

    let reasoning = build_reasoning(&scores, weighted, rule, conflict.gap, conflict.conflict, input.negotiation);

    Decision {
        final_decision,
        weighted_score: weighted,
        confidence,
        critical_factors,
        red_flags_summary,
        score_gap: conflict.gap,
        conflict_detected: conflict.conflict,
        negotiation_considered: input.negotiation.is_some(),
        reasoning,
        next_steps: next_steps(final_decision).to_string(),
        data_quality,
    }
}

fn collect_data_quality(
    panel: &PanelEvaluations,
    upstream: &[DataQualityIssue],
) -> Vec<DataQualityIssue> {
    let mut issues: Vec<DataQualityIssue> = panel
        .missing_roles()
        .into_iter()
        .map(|role| DataQualityIssue::MissingEvaluation { role })
        .collect();

    for evaluation in panel.iter() {
        if let ScoreProvenance::Defaulted { reason } = &evaluation.provenance {
            issues.push(DataQualityIssue::DefaultedScore {
                role: evaluation.role,
                reason: reason.clone(),
            });
        }
    }

    for issue in upstream {
        if !issues.contains(issue) {
            issues.push(issue.clone());
        }
    }
    issues
}

// ────────────────────────────────────────────────────────────────────────────
// Narrative
// ────────────────────────────────────────────────────────────────────────────

fn build_reasoning(
    scores: &RaterScores,
    weighted: f64,
    rule: DecisionRule,
    gap: f64,
    conflict: bool,
    negotiation: Option<&NegotiationResult>,
) -> String {
    let mut reasoning = format!(
        "Weighted score {weighted:.2} (technical {} × {TECHNICAL_WEIGHT}, culture {} × {CULTURE_WEIGHT}, business {} × {BUSINESS_WEIGHT}). ",
        scores.technical, scores.culture, scores.business
    );

    reasoning.push_str(&match rule {
        DecisionRule::MeetsHireBar => {
            format!("Meets the hire threshold of {HIRE_THRESHOLD} with no critical red flags.")
        }
        DecisionRule::BelowPassThreshold => {
            format!("Falls below the pass threshold of {PASS_THRESHOLD}.")
        }
        DecisionRule::MultipleFlaggedRaters(n) => {
            format!("{n} of 3 raters raised red flags.")
        }
        DecisionRule::CriticalFlagBlocksHire => format!(
            "Clears the hire threshold of {HIRE_THRESHOLD}, but a critical red flag blocks a hire."
        ),
        DecisionRule::Borderline => format!(
            "Between {PASS_THRESHOLD} and {HIRE_THRESHOLD}; warrants a second interview."
        ),
    });

    if conflict {
        match negotiation {
            Some(n) => {
                reasoning.push_str(&format!(
                    " Raters disagreed by {gap:.1} points. Negotiation: {}",
                    n.score_explanation.trim()
                ));
                if !n.key_disagreements.is_empty() {
                    reasoning.push_str(&format!(
                        " Key disagreements: {}.",
                        n.key_disagreements.join("; ")
                    ));
                }
            }
            None => reasoning.push_str(&format!(
                " Raters disagreed by {gap:.1} points; no negotiation narrative was available."
            )),
        }
    }

    reasoning
}

fn next_steps(decision: FinalDecision) -> &'static str {
    match decision {
        FinalDecision::Hire => "Extend an offer and prepare the onboarding plan.",
        FinalDecision::Pass => "Send a respectful rejection with feedback from the panel.",
        FinalDecision::Maybe => "Schedule a second interview focused on the flagged areas.",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
