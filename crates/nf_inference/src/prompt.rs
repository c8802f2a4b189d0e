/// Longest article excerpt sent to the model, in characters.
pub const MAX_INPUT_CHARS: usize = 8000;

/// Cuts `text` to at most `max_chars` characters without splitting a code point.
pub fn clip(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn build_prompt(text: &str) -> String {
    let clipped = clip(text, MAX_INPUT_CHARS);
    format!(
        r#"You are an expert news summariser.
Summarise the following article into EXACTLY 5 concise bullet points (max ~15 words each).
Then classify overall sentiment as "positive", "neutral", or "negative".
Also provide up to 5 keywords.
Finally, assess the potential impact of the news and return it as a single string in the format:
"Level - short description impact"
Example: "High - Could affect global nickel supply chain".

Return STRICT JSON ONLY with keys: bullets, sentiment, keywords, impact.
NO extra text.

Article:
"""
{clipped}
"""

JSON schema:
{{
  "bullets": ["...", "...", "...", "...", "..."],
  "sentiment": "positive|neutral|negative",
  "keywords": ["...", "..."],
  "impact": "Level - short description"
}}"#
    )
}

/// The article excerpt embedded in a prompt built by [`build_prompt`].
pub fn article_from_prompt(prompt: &str) -> Option<&str> {
    let start = prompt.find("\"\"\"\n")? + 4;
    let end = prompt[start..].find("\n\"\"\"")? + start;
    Some(&prompt[start..end])
}
