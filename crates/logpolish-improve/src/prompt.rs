//! Rewrite prompt construction.

use crate::improver::ImproveRequest;

const QUOTE_CHARS: [char; 3] = ['"', '\'', '`'];

/// Strip any run of leading/trailing `"`, `'`, or `` ` `` characters.
pub fn strip_quotes(text: &str) -> &str {
    text.trim_matches(QUOTE_CHARS.as_slice())
}

/// Build the instruction sent to the provider for one log message.
///
/// Pure: the same request always yields the same prompt.
pub fn build_prompt(request: &ImproveRequest<'_>) -> String {
    let clean_text = strip_quotes(request.original);

    let mut context = format!(
        "Function: {}\nLog Level: {}",
        request.function_call, request.log_level
    );
    if !request.arguments.is_empty() {
        context.push_str("\nArguments: ");
        context.push_str(request.arguments);
    }

    format!(
        "Improve this Go log message for clarity, professionalism, and consistency.

{context}
Original message: {clean_text}

Requirements:
- Use clear, professional language
- Be specific and actionable
- Use sentence case (capitalize first word only, except proper nouns)
- If this is a format string with %v, %s, %d, etc., keep those format verbs
- Return ONLY the improved message text, without quotes
- Keep it concise (under 100 characters if possible)

Improved message:"
    )
}
