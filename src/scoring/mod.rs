//! Scoring Engine module.
//!
//! Computes the weighted composite match score between a resume and a job
//! posting, before and after tailoring. The same composite formula serves
//! both the LLM evidence path and the deterministic keyword fallback, so the
//! two stay comparable in shape and identically bounded. Scoring is pure:
//! identical inputs always produce byte-identical breakdowns.

mod fallback;
mod quality;

pub use fallback::{keyword_evidence, ranked_keywords, score_match_fallback};
pub use quality::human_quality;

use serde::{Deserialize, Serialize};

/// Breakdown version for the LLM evidence path.
pub const DETERMINISTIC_V1: &str = "deterministic-v1";
/// Breakdown version for the keyword-fallback path.
pub const FALLBACK_KEYWORD_V1: &str = "fallback-keyword-v1";

/// Component weights. Changing these requires bumping the breakdown version;
/// breakdowns from different versions are never numerically comparable.
pub const WEIGHT_CORE: f64 = 0.35;
pub const WEIGHT_MUST_HAVE: f64 = 0.30;
pub const WEIGHT_NICE_TO_HAVE: f64 = 0.10;
pub const WEIGHT_RESPONSIBILITIES: f64 = 0.15;
pub const WEIGHT_HUMAN: f64 = 0.10;

/// Kind of vacancy signal an evidence item maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SignalType {
    Core,
    MustHave,
    NiceToHave,
    Responsibility,
}

/// One weighted signal with before/after presence and strength.
///
/// Produced either by the LLM evidence-mapping step or by the text
/// containment heuristic; the scorer does not care which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub signal_type: SignalType,
    pub name: String,
    /// Strength in [0, 1]; values outside the range are clamped on read.
    pub strength_before: f64,
    pub strength_after: f64,
    pub present_before: bool,
    pub present_after: bool,
    #[serde(default)]
    pub evidence_before: Vec<String>,
    #[serde(default)]
    pub evidence_after: Vec<String>,
}

/// One weighted component of the composite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentScore {
    pub before: f64,
    pub after: f64,
    pub weight: f64,
}

/// Boolean gate flags attached to a breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateFlags {
    pub schema_valid: bool,
    pub identity_stable: bool,
    pub hallucination_free: bool,
}

impl Default for GateFlags {
    fn default() -> Self {
        Self {
            schema_valid: true,
            identity_stable: true,
            hallucination_free: true,
        }
    }
}

/// Versioned record of the five weighted components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Algorithm version; breakdowns from different versions must never be
    /// compared numerically as if equivalent.
    pub version: String,
    pub core: ComponentScore,
    pub must_have: ComponentScore,
    pub nice_to_have: ComponentScore,
    pub responsibilities: ComponentScore,
    pub human_quality: ComponentScore,
    pub gates: GateFlags,
}

/// Final scoring result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchScore {
    pub match_score_before: f64,
    pub match_score_after: f64,
    pub breakdown: ScoreBreakdown,
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Component score for one signal group: `30 + 70·avg(clamp01(strength +
/// 0.2·presence))`. An empty group defaults to a neutral 60 for both sides;
/// absence of applicable signals never penalizes.
fn group_component(items: &[&EvidenceItem], weight: f64) -> ComponentScore {
    if items.is_empty() {
        return ComponentScore {
            before: 60.0,
            after: 60.0,
            weight,
        };
    }
    let n = items.len() as f64;
    let avg_before: f64 = items
        .iter()
        .map(|i| clamp01(clamp01(i.strength_before) + if i.present_before { 0.2 } else { 0.0 }))
        .sum::<f64>()
        / n;
    let avg_after: f64 = items
        .iter()
        .map(|i| clamp01(clamp01(i.strength_after) + if i.present_after { 0.2 } else { 0.0 }))
        .sum::<f64>()
        / n;
    ComponentScore {
        before: 30.0 + 70.0 * avg_before,
        after: 30.0 + 70.0 * avg_after,
        weight,
    }
}

/// Compute the composite match score.
///
/// `version` tags the breakdown; pass [`DETERMINISTIC_V1`] for LLM-derived
/// evidence and [`FALLBACK_KEYWORD_V1`] for heuristic pseudo-signals.
///
/// Invariants: both scores lie in [0, 100] and `match_score_after >=
/// match_score_before`. The latter is a deliberate one-directional clamp:
/// tailoring never reduces the reported score even when the raw composite
/// would.
pub fn score(
    base_resume: &str,
    tailored_resume: &str,
    items: &[EvidenceItem],
    gates: GateFlags,
    version: &str,
) -> MatchScore {
    let group = |t: SignalType, w: f64| {
        let members: Vec<&EvidenceItem> = items.iter().filter(|i| i.signal_type == t).collect();
        group_component(&members, w)
    };

    let core = group(SignalType::Core, WEIGHT_CORE);
    let must_have = group(SignalType::MustHave, WEIGHT_MUST_HAVE);
    let nice_to_have = group(SignalType::NiceToHave, WEIGHT_NICE_TO_HAVE);
    let responsibilities = group(SignalType::Responsibility, WEIGHT_RESPONSIBILITIES);
    let human_quality = ComponentScore {
        before: human_quality(base_resume),
        after: human_quality(tailored_resume),
        weight: WEIGHT_HUMAN,
    };

    let composite = |pick: fn(&ComponentScore) -> f64| {
        [
            &core,
            &must_have,
            &nice_to_have,
            &responsibilities,
            &human_quality,
        ]
        .iter()
        .map(|c| c.weight * pick(c))
        .sum::<f64>()
    };

    let before = round1(composite(|c| c.before).clamp(0.0, 100.0));
    let after_raw = round1(composite(|c| c.after).clamp(0.0, 100.0));
    let after = after_raw.max(before);

    MatchScore {
        match_score_before: before,
        match_score_after: after,
        breakdown: ScoreBreakdown {
            version: version.to_string(),
            core,
            must_have,
            nice_to_have,
            responsibilities,
            human_quality,
            gates,
        },
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(
        signal_type: SignalType,
        strength_before: f64,
        strength_after: f64,
        present_before: bool,
        present_after: bool,
    ) -> EvidenceItem {
        EvidenceItem {
            signal_type,
            name: "signal".to_string(),
            strength_before,
            strength_after,
            present_before,
            present_after,
            evidence_before: vec![],
            evidence_after: vec![],
        }
    }

    #[test]
    fn test_empty_groups_are_neutral() {
        let result = score("base resume", "tailored resume", &[], GateFlags::default(), DETERMINISTIC_V1);
        assert_eq!(result.breakdown.core.before, 60.0);
        assert_eq!(result.breakdown.core.after, 60.0);
        assert_eq!(result.breakdown.responsibilities.before, 60.0);
        assert!(result.match_score_before >= 0.0 && result.match_score_before <= 100.0);
        assert!(result.match_score_after >= result.match_score_before);
    }

    #[test]
    fn test_single_core_item_improvement() {
        // One core signal, absent before, strong after.
        let items = vec![item(SignalType::Core, 0.0, 0.9, false, true)];
        let result = score("plain resume text", "plain resume text", &items, GateFlags::default(), DETERMINISTIC_V1);

        // Core before: 30 + 70*clamp01(0 + 0) = 30.
        assert_eq!(result.breakdown.core.before, 30.0);
        // Core after: 30 + 70*clamp01(0.9 + 0.2) = 30 + 70*1.0 = 100.
        assert_eq!(result.breakdown.core.after, 100.0);
        assert!(result.match_score_after > result.match_score_before);
        assert!(result.match_score_after >= result.match_score_before);
    }

    #[test]
    fn test_strength_plus_presence_clamped_to_one() {
        let items = vec![item(SignalType::MustHave, 1.0, 1.0, true, true)];
        let result = score("r", "r", &items, GateFlags::default(), DETERMINISTIC_V1);
        assert_eq!(result.breakdown.must_have.before, 100.0);
        assert_eq!(result.breakdown.must_have.after, 100.0);
    }

    #[test]
    fn test_out_of_range_strength_clamped() {
        let items = vec![item(SignalType::Core, -0.5, 2.0, false, false)];
        let result = score("r", "r", &items, GateFlags::default(), DETERMINISTIC_V1);
        assert_eq!(result.breakdown.core.before, 30.0);
        assert_eq!(result.breakdown.core.after, 100.0);
    }

    #[test]
    fn test_after_never_below_before() {
        // Regression after tailoring: raw composite drops, reported score
        // must not.
        let items = vec![item(SignalType::Core, 0.9, 0.1, true, false)];
        let result = score("r", "r", &items, GateFlags::default(), DETERMINISTIC_V1);
        assert!(result.breakdown.core.after < result.breakdown.core.before);
        assert_eq!(result.match_score_after, result.match_score_before);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum = WEIGHT_CORE
            + WEIGHT_MUST_HAVE
            + WEIGHT_NICE_TO_HAVE
            + WEIGHT_RESPONSIBILITIES
            + WEIGHT_HUMAN;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_idempotent_byte_identical() {
        let items = vec![
            item(SignalType::Core, 0.3, 0.8, false, true),
            item(SignalType::NiceToHave, 0.5, 0.5, true, true),
        ];
        let a = score("base", "tailored", &items, GateFlags::default(), DETERMINISTIC_V1);
        let b = score("base", "tailored", &items, GateFlags::default(), DETERMINISTIC_V1);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_version_tag_propagated() {
        let result = score("r", "r", &[], GateFlags::default(), FALLBACK_KEYWORD_V1);
        assert_eq!(result.breakdown.version, FALLBACK_KEYWORD_V1);
    }
}
