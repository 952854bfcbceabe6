//! The analysis prompt template.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing the instructions (adding a
//!    section, tweaking the tone) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can assert the template's structure
//!    (all six section headings, the placeholder) without calling a model.
//!
//! The template is a pure function of the extracted text: the same report
//! text always produces the same prompt.

/// Placeholder substituted with the extracted report text.
const REPORT_TEXT_MARKER: &str = "{report_text}";

/// The six section headings, in order. Exposed so callers and tests can
/// verify a built prompt carries every section verbatim.
pub const SECTION_HEADINGS: [&str; 6] = [
    "1. **Analysis Result of the Report:**",
    "2. **Potential Problems the Patient Might Face in the Near Future:**",
    "3. **Assessment of the Report's Overall Quality:**",
    "4. **Symptoms of Diseases That Might Occur:**",
    "5. **Recommendations for the Patient:**",
    "6. **Online Resources for Further Knowledge:**",
];

/// Instruction template requesting a six-section medical analysis.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an advanced AI with extensive training in medical analysis, healthcare diagnostics, and patient recommendations. Your task is to thoroughly analyze the provided medical report text and respond with detailed insights and guidance. Your analysis should be comprehensive, accurate, and clear.

Medical Report Text:
{report_text}

Please provide the following information:

1. **Analysis Result of the Report:**
    - Summarize the key findings from the report.
    - Interpret significant medical terms and their implications.

2. **Potential Problems the Patient Might Face in the Near Future:**
    - Identify possible health risks or conditions based on the report findings.
    - Discuss the progression of any identified diseases or symptoms.

3. **Assessment of the Report's Overall Quality:**
    - Evaluate whether the report indicates good or bad health.
    - Determine if the patient should be concerned about their health based on the findings.

4. **Symptoms of Diseases That Might Occur:**
    - List potential diseases or conditions the patient might develop.
    - Describe the associated symptoms and early warning signs.

5. **Recommendations for the Patient:**
    - Suggest lifestyle modifications or preventive measures.
    - Recommend medications, therapies, or treatments if applicable.
    - Advise on follow-up appointments or further medical evaluation.

6. **Online Resources for Further Knowledge:**
    - Provide original website links to reputable websites for reliable medical information.
    - Suggest patient support groups or organizations for further assistance.

Make sure your response is detailed, accurate, and tailored to the specific content of the medical report provided. Your goal is to offer the patient a thorough understanding of their health status and actionable advice to improve or maintain their well-being."#;

/// Characters the template occupies on its own (placeholder excluded).
///
/// Used by the config builder to reject prompt budgets smaller than the
/// fixed instructions.
pub fn prompt_overhead_chars() -> usize {
    ANALYSIS_PROMPT_TEMPLATE.chars().count() - REPORT_TEXT_MARKER.chars().count()
}

/// Build the prompt for one report.
///
/// Substitutes `extracted_text` into [`ANALYSIS_PROMPT_TEMPLATE`]. When
/// `max_prompt_chars` is set and the result would exceed it, the extracted
/// text is truncated at a character boundary so the built prompt fits; the
/// instructions themselves are never cut. With `None` (the default) the
/// extracted text is submitted whole, however large.
pub fn build_prompt(extracted_text: &str, max_prompt_chars: Option<usize>) -> String {
    let text = match max_prompt_chars {
        Some(max) => {
            let budget = max.saturating_sub(prompt_overhead_chars());
            truncate_chars(extracted_text, budget)
        }
        None => extracted_text,
    };
    if text.len() < extracted_text.len() {
        tracing::warn!(
            original_chars = extracted_text.chars().count(),
            kept_chars = text.chars().count(),
            "Extracted text truncated to fit the configured prompt budget"
        );
    }
    ANALYSIS_PROMPT_TEMPLATE.replacen(REPORT_TEXT_MARKER, text, 1)
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => &s[..byte_idx],
        None => s,
    }
}
