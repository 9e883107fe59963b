//! Prompt construction for the generation scenarios.
//!
//! Prompts are plain functions of their inputs; no templating engine. Every
//! system prompt pins the output contract to a bare JSON object so the
//! extractor's fenced-block handling stays a tolerance, not a requirement.

pub const PARSE_SYSTEM: &str = "You are a resume parser. Read the resume text and return a single \
JSON object with the keys: fullName, email, phone, location, summary, skills (array of strings), \
experience (array of {title, company, start, end, highlights}), education (array of \
{institution, degree, year}). Use null for unknown scalar fields and empty arrays where nothing \
applies. Return only the JSON object, no commentary.";

pub const TAILOR_SYSTEM: &str = "You are a resume tailoring assistant. Rewrite the resume to \
fit the vacancy without inventing employers, titles, dates, or credentials, and without changing \
the candidate's identity. Return a single JSON object with the keys: resumeText, \
matchScoreBefore (0-100), matchScoreAfter (0-100, never lower than matchScoreBefore), and \
changes (array of short strings describing each edit). Return only the JSON object.";

pub const COVER_LETTER_SYSTEM: &str = "You are a cover-letter writer. Using the resume and the \
vacancy, write a concise, specific cover letter in the candidate's voice. Return a single JSON \
object with the keys: subject (nullable string) and body (string). Return only the JSON object.";

pub const SIGNAL_EXTRACTION_SYSTEM: &str = "You are a job-posting analyst. Extract the weighted \
hiring signals from the vacancy text. Return a single JSON object with the keys: core, mustHave, \
niceToHave, responsibilities, each an array of {name, weight} where weight defaults to 1.0. \
Return only the JSON object.";

pub const EVIDENCE_MAPPING_SYSTEM: &str = "You are a resume-vacancy matcher. For every provided \
signal, judge its presence and strength in the base resume and in the tailored resume. Return a \
single JSON object with the key items: an array of {signalType (core|mustHave|niceToHave|\
responsibility), name, strengthBefore (0-1), strengthAfter (0-1), presentBefore, presentAfter, \
evidenceBefore (array of quotes), evidenceAfter (array of quotes)}. Return only the JSON object.";

pub fn parse_prompt(resume_text: &str) -> String {
    format!("Resume text:\n---\n{resume_text}\n---")
}

pub fn tailor_prompt(base_resume: &str, vacancy_text: &str) -> String {
    format!(
        "Vacancy:\n---\n{vacancy_text}\n---\n\nResume:\n---\n{base_resume}\n---"
    )
}

pub fn cover_letter_prompt(base_resume: &str, vacancy_text: &str) -> String {
    format!(
        "Vacancy:\n---\n{vacancy_text}\n---\n\nResume:\n---\n{base_resume}\n---"
    )
}

pub fn signal_extraction_prompt(vacancy_text: &str) -> String {
    format!("Vacancy text:\n---\n{vacancy_text}\n---")
}

pub fn evidence_mapping_prompt(
    signals_json: &str,
    base_resume: &str,
    tailored_resume: &str,
) -> String {
    format!(
        "Signals:\n{signals_json}\n\nBase resume:\n---\n{base_resume}\n---\n\n\
Tailored resume:\n---\n{tailored_resume}\n---"
    )
}
