//! Prompt construction for idea expansion

use crate::expansion::catalog::SectionCatalog;

/// Build a deterministic expansion prompt for an idea transcript.
pub fn build_expansion_prompt(transcript: &str, catalog: &SectionCatalog) -> String {
    let sections = catalog
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {} ({}): {}", i + 1, s.title, s.key, s.instruction))
        .collect::<Vec<_>>()
        .join("\n\n");

    let shape = catalog
        .iter()
        .map(|s| format!("  \"{}\": \"Your analysis here...\"", s.key))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "You are a business analyst helping an entrepreneur develop their business idea.\n\
\n\
Idea Transcript: \"{transcript}\"\n\
\n\
Please analyze this idea and provide structured insights for the following sections:\n\
\n\
{sections}\n\
\n\
IMPORTANT: Respond ONLY with a valid JSON object in this exact format:\n\
{{\n\
\"title\": \"A short, memorable title; use the best name option if one was requested\",\n\
\"sections\": {{\n\
{shape}\n\
}}\n\
}}\n\
\n\
FORMAT REQUIREMENTS:\n\
- Each section should be CONCISE but detailed\n\
- Use 1-2 brief intro sentences followed by bullet points\n\
- Keep bullets short and scannable (1 line each)\n\
- Focus on actionable, specific insights\n\
- Do not write long paragraphs\n\
- Do not wrap the JSON in markdown code fences\n\
- Do not include any text outside the JSON object."
    )
}
