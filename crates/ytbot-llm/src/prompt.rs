//! Prompt building and response parsing.

use ytbot_models::Script;

use crate::error::{LlmError, LlmResult};

pub const SYSTEM_PROMPT: &str = "You are a scriptwriter for viral, fact-driven vertical short videos. \
You always answer with a single JSON object and nothing else.";

/// JSON schema of `Script`, embedded in the prompt.
pub fn script_schema() -> String {
    let schema = schemars::schema_for!(Script);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// Build the user prompt for a topic.
pub fn build_prompt(topic: &str, scene_count: usize) -> String {
    format!(
        r#"Write a script for a 40-60 second vertical short video about: "{topic}"

Return ONLY a single JSON object matching this JSON schema:
{schema}

Rules:
- Exactly {scene_count} scenes, in speaking order.
- "narration" is what the narrator says in that scene: one or two short, punchy sentences, no emojis, no stage directions.
- The first scene must hook the viewer in the first three seconds.
- "search_terms" are 2-3 concrete, visual stock-footage queries (e.g. "city traffic at night"), most specific first.
- "title" is a catchy title under 70 characters.
- "description" is a two-sentence video description followed by 3 hashtags.
- "tags" are 5-8 single-word or short keyword tags without '#'.
"#,
        schema = script_schema(),
    )
}

/// Extract the JSON object from a model reply.
///
/// Handles markdown code fences and leading/trailing chatter.
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text).trim();

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

/// Parse and normalize a model reply into a script for `topic`.
pub fn parse_script(reply: &str, topic: &str) -> LlmResult<Script> {
    let json = extract_json(reply);
    let script: Script = serde_json::from_str(json)
        .map_err(|e| LlmError::invalid_response(format!("Failed to parse script JSON: {}", e)))?;
    Ok(script.normalized(topic)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"{
        "title": "Why Exercise Rewires Your Brain",
        "description": "Daily movement changes more than muscles. #fitness",
        "tags": ["fitness", "health"],
        "scenes": [
            {"narration": "Thirty minutes a day changes everything.", "search_terms": ["runner sunrise"]},
            {"narration": "Your heart gets stronger with every beat.", "search_terms": ["heartbeat monitor", "cycling"]}
        ]
    }"#;

    #[test]
    fn test_extract_json_plain() {
        assert_eq!(extract_json("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_extract_json_code_fence() {
        let fenced = format!("```json\n{}\n```", REPLY);
        assert!(extract_json(&fenced).starts_with('{'));
        assert!(extract_json(&fenced).ends_with('}'));
    }

    #[test]
    fn test_extract_json_with_chatter() {
        assert_eq!(
            extract_json("Sure! Here it is: {\"scenes\": []} Enjoy."),
            "{\"scenes\": []}"
        );
    }

    #[test]
    fn test_parse_script() {
        let script = parse_script(REPLY, "Daily Exercise").unwrap();
        assert_eq!(script.scenes.len(), 2);
        assert_eq!(script.title, "Why Exercise Rewires Your Brain");
        assert_eq!(script.scenes[1].search_terms.len(), 2);
    }

    #[test]
    fn test_parse_script_without_scenes() {
        let result = parse_script(r#"{"title": "x", "scenes": []}"#, "t");
        assert!(matches!(result, Err(LlmError::InvalidScript(_))));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_script("I cannot help with that.", "t"),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_prompt_mentions_topic_and_schema() {
        let prompt = build_prompt("Octopus intelligence", 5);
        assert!(prompt.contains("Octopus intelligence"));
        assert!(prompt.contains("Exactly 5 scenes"));
        assert!(prompt.contains("search_terms"));
    }
}
