//! Structured-output schemas for the generation scenarios.
//!
//! Each scenario deserializes into a typed struct; a failed deserialization
//! is the schema-validation failure the retry loop acts on. Cross-field
//! invariants that serde cannot express live in `validate` methods.

use serde::{Deserialize, Serialize};

use crate::scoring::EvidenceItem;

/// Output of the resume-parse scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResume {
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
}

impl ParsedResume {
    pub fn validate(&self) -> Result<(), String> {
        if self.full_name.trim().is_empty() {
            return Err("fullName must not be empty".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationEntry {
    pub institution: String,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

/// Output of the resume-tailor scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailoredResume {
    pub resume_text: String,
    pub match_score_before: f64,
    pub match_score_after: f64,
    #[serde(default)]
    pub changes: Vec<String>,
}

impl TailoredResume {
    /// Cross-field invariant: scores bounded and never reduced by tailoring.
    pub fn validate(&self) -> Result<(), String> {
        if self.resume_text.trim().is_empty() {
            return Err("resumeText must not be empty".to_string());
        }
        for (field, value) in [
            ("matchScoreBefore", self.match_score_before),
            ("matchScoreAfter", self.match_score_after),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!("{field} out of range: {value}"));
            }
        }
        if self.match_score_after < self.match_score_before {
            return Err(format!(
                "matchScoreAfter ({}) lower than matchScoreBefore ({})",
                self.match_score_after, self.match_score_before
            ));
        }
        Ok(())
    }
}

/// Output of the cover-letter scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetter {
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
}

impl CoverLetter {
    pub fn validate(&self) -> Result<(), String> {
        if self.body.trim().is_empty() {
            return Err("body must not be empty".to_string());
        }
        Ok(())
    }
}

/// One weighted signal requirement extracted from a vacancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSpec {
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// Stage one of detailed scoring: weighted signals from the vacancy text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct SignalExtraction {
    pub core: Vec<SignalSpec>,
    pub must_have: Vec<SignalSpec>,
    pub nice_to_have: Vec<SignalSpec>,
    pub responsibilities: Vec<SignalSpec>,
}

impl SignalExtraction {
    pub fn validate(&self) -> Result<(), String> {
        if self.core.is_empty()
            && self.must_have.is_empty()
            && self.nice_to_have.is_empty()
            && self.responsibilities.is_empty()
        {
            return Err("at least one signal group must be non-empty".to_string());
        }
        Ok(())
    }

    pub fn signal_count(&self) -> usize {
        self.core.len() + self.must_have.len() + self.nice_to_have.len() + self.responsibilities.len()
    }
}

/// Stage two of detailed scoring: evidence mapped against both resumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceMapping {
    pub items: Vec<EvidenceItem>,
}

impl EvidenceMapping {
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("items must not be empty".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tailored_resume_invariant_rejects_regression() {
        let out = TailoredResume {
            resume_text: "text".to_string(),
            match_score_before: 70.0,
            match_score_after: 55.0,
            changes: vec![],
        };
        assert!(out.validate().is_err());
    }

    #[test]
    fn test_tailored_resume_invariant_accepts_equal_scores() {
        let out = TailoredResume {
            resume_text: "text".to_string(),
            match_score_before: 70.0,
            match_score_after: 70.0,
            changes: vec![],
        };
        assert!(out.validate().is_ok());
    }

    #[test]
    fn test_tailored_resume_rejects_out_of_range() {
        let out = TailoredResume {
            resume_text: "text".to_string(),
            match_score_before: -1.0,
            match_score_after: 40.0,
            changes: vec![],
        };
        assert!(out.validate().is_err());
    }

    #[test]
    fn test_parsed_resume_missing_optional_fields() {
        let parsed: ParsedResume =
            serde_json::from_str("{\"fullName\": \"Ada Lovelace\"}").unwrap();
        assert_eq!(parsed.full_name, "Ada Lovelace");
        assert!(parsed.skills.is_empty());
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_signal_extraction_requires_some_signals() {
        let empty = SignalExtraction::default();
        assert!(empty.validate().is_err());

        let extraction: SignalExtraction =
            serde_json::from_str("{\"core\": [{\"name\": \"rust\"}]}").unwrap();
        assert!(extraction.validate().is_ok());
        assert_eq!(extraction.core[0].weight, 1.0);
        assert_eq!(extraction.signal_count(), 1);
    }

    #[test]
    fn test_cover_letter_rejects_blank_body() {
        let letter = CoverLetter {
            subject: None,
            body: "   ".to_string(),
        };
        assert!(letter.validate().is_err());
    }
}
