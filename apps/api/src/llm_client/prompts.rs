// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Bumped whenever a template's output contract changes. Stored in item provenance.
pub const PROMPT_VERSION: &str = "v1";

/// The five-criterion rubric shared by every open-answer grader.
pub const RUBRIC: &str = "\
Rubric (0-5 each):
- correctness: factual/technical correctness
- completeness: covers key points
- clarity: structured, easy to follow
- depth: edge cases, complexity, tradeoffs where relevant
- reasoning: explains approach/why

Return ONLY valid JSON matching the required schema.";

/// JSON schema block for rubric evaluations. `{extra_fields}` lets callers
/// append variant-specific keys.
pub const RUBRIC_SCHEMA_TEMPLATE: &str = r#"{
  "scores": {
    "correctness": 0-5,
    "completeness": 0-5,
    "clarity": 0-5,
    "depth": 0-5,
    "reasoning": 0-5
  },
  "overall": 0-5 (average of the five scores, can be decimal),
  "strengths": ["..."],
  "gaps": ["..."],
  "improvements": ["..."],
  "model_answer": "...",
  "next_drill_topic": "..."{extra_fields}
}"#;

/// Renders the rubric schema with optional extra keys (each line already indented).
pub fn rubric_schema(extra_fields: &[&str]) -> String {
    let extra = extra_fields
        .iter()
        .map(|f| format!(",\n  {f}"))
        .collect::<String>();
    fill_template(RUBRIC_SCHEMA_TEMPLATE, &[("extra_fields", extra.as_str())])
}

/// Fills `{name}` placeholders in a single left-to-right pass. Substituted
/// values are never rescanned, so braces inside user or model text survive
/// verbatim. Unknown placeholders are left as written.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let hit = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Renders a bullet list, or `None` if there is nothing to list.
pub fn bullet_list<S: AsRef<str>>(items: &[S]) -> Option<String> {
    let lines: Vec<String> = items
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(|s| format!("- {s}"))
        .collect();
    (!lines.is_empty()).then(|| lines.join("\n"))
}
