//! Wraps a raw user question in the lounge-assistant instructions sent to Gemini.

/// Build the full prompt for a user query.
///
/// The query is embedded verbatim; nothing is escaped or truncated.
pub fn build_prompt(query: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are an airport lounge assistant. Only respond to airport lounge related queries. ");
    prompt.push_str("If you receive any other query, respond that you cannot help with it as you are just an airport lounge assistant.\n");
    prompt.push_str(&format!(
        "Provide focused information about airport lounges based on this query: \"{}\".\n\n",
        query
    ));
    prompt.push_str("Keep your response directly relevant to the query.\n\n");
    prompt.push_str("Format the response in well-structured Markdown with proper headings, bullet points, and bold text. ");
    prompt.push_str("Avoid using HTML tags.\n\n");
    prompt.push_str("After providing the specific information requested, add a section titled \"Related Questions\" ");
    prompt.push_str("with 3-4 follow-up questions that cover information you didn't include, such as:\n");
    prompt.push_str("1. Terminal locations of lounges\n");
    prompt.push_str("2. Hours of operation\n");
    prompt.push_str("3. Specific amenities\n");
    prompt.push_str("4. Access requirements\n");
    prompt.push_str("5. Alternative lounges\n\n");
    prompt.push_str("Format these as a numbered list.");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_query_verbatim() {
        let query = "Lounges at JFK? <b>now</b> \"quoted\"";
        let prompt = build_prompt(query);
        assert!(prompt.contains(&format!("\"{}\"", query)));
    }

    #[test]
    fn test_prompt_sets_lounge_only_persona() {
        let prompt = build_prompt("weather in Paris");
        assert!(prompt.starts_with("You are an airport lounge assistant."));
        assert!(prompt.contains("just an airport lounge assistant"));
    }

    #[test]
    fn test_prompt_requests_markdown_without_html() {
        let prompt = build_prompt("x");
        assert!(prompt.contains("Markdown"));
        assert!(prompt.contains("Avoid using HTML tags."));
    }

    #[test]
    fn test_prompt_requests_related_questions() {
        let prompt = build_prompt("x");
        assert!(prompt.contains("\"Related Questions\""));
        assert!(prompt.contains("3-4 follow-up questions"));
        for hint in ["Terminal locations", "Hours of operation", "Specific amenities", "Access requirements", "Alternative lounges"] {
            assert!(prompt.contains(hint), "missing hint: {}", hint);
        }
        assert!(prompt.ends_with("Format these as a numbered list."));
    }

    #[test]
    fn test_prompt_passes_long_input_through() {
        let query = "a".repeat(10_000);
        assert!(build_prompt(&query).contains(&query));
    }
}
