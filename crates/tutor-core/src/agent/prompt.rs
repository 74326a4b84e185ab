//! Persona prompts and inbound text preprocessing.

use tutor_types::identity::GUIDED_LEVEL;

/// Message that asks for an immediate summary instead of an answer.
pub const SUMMARIZE_COMMAND: &str = "-summarize";

/// Suffix that turns `"<topic> -e"` into a request for an example.
const EXAMPLE_SUFFIX: &str = " -e";

/// Concise teaching assistant for students working at the regular level.
pub const DEFAULT_PROMPT: &str = "\
You are a concise, professional Python teaching assistant. You can see the \
student's earlier questions; use them as context for this reply.
Give direct, useful hints rather than full solutions, and encourage the \
student to think and look things up. Introduce proper terminology and a \
concrete example when it helps.

Keep replies to 5-8 lines and no more than 6 paragraphs, within roughly 450 tokens.
If you include code, use a single ```python block with one short example and close it with ```.
- If the student asks a question, pitch the explanation at their level.
- If the student writes `XXX -e`, give one related example and briefly explain what it is for.
Keep the tone clear and the reply well structured.";

/// Patient, guiding assistant for students who need more support.
pub const GUIDED_PROMPT: &str = "\
You are a very patient Python teaching assistant who guides rather than \
tells. You can see the student's earlier questions; use them as context for \
this reply. This student's foundations are still shaky: avoid handing over \
answers, and help them think with simple examples, everyday analogies, \
questions back to them and step-by-step explanations that build confidence.

Keep replies to 5-8 lines and no more than 6 paragraphs, within roughly 450 tokens.
If you include code, use a single ```python block with one short example and close it with ```.
- If the student sends a piece of Python code, do not explain it straight \
away. Ask which kind of help they want and have them reply with a number:
  1. Explain the logic
  2. Explain the syntax
  3. Show another way to write it
  4. Add comments
  5. Check the code for problems
  Wait for their number before continuing.
- If the student asks a question, use a simple analogy or explain it in small steps.
- If the student writes `XXX -e`, give one related example and explain in plain words what it is for.";

/// Persona prompt for a student level.
pub fn system_prompt_for(level: &str) -> &'static str {
    if level == GUIDED_LEVEL {
        GUIDED_PROMPT
    } else {
        DEFAULT_PROMPT
    }
}

/// Normalise what the student typed before it goes to the model.
///
/// Ideographic spaces become ASCII spaces, and a trailing ` -e` asks for a
/// usage example of the topic in front of it. The raw text is what gets
/// logged; only the model sees this form.
pub fn preprocess(input: &str) -> String {
    let normalized = input.replace('\u{3000}', " ");
    match normalized.strip_suffix(EXAMPLE_SUFFIX) {
        Some(topic) if !topic.trim().is_empty() => format!(
            "Give one example of using \"{}\" in Python and explain what it is for.",
            topic.trim()
        ),
        _ => normalized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_by_level() {
        assert_eq!(system_prompt_for("02"), GUIDED_PROMPT);
        assert_eq!(system_prompt_for("01"), DEFAULT_PROMPT);
        assert_eq!(system_prompt_for("03"), DEFAULT_PROMPT);
    }

    #[test]
    fn test_preprocess_passthrough() {
        assert_eq!(preprocess("what is a tuple?"), "what is a tuple?");
    }

    #[test]
    fn test_preprocess_ideographic_space() {
        assert_eq!(preprocess("list\u{3000}slicing"), "list slicing");
    }

    #[test]
    fn test_preprocess_example_request() {
        let out = preprocess("list comprehension -e");
        assert_eq!(
            out,
            "Give one example of using \"list comprehension\" in Python and explain what it is for."
        );

        // Ideographic space before the flag still counts.
        let out = preprocess("zip\u{3000}-e");
        assert!(out.contains("\"zip\""));
    }

    #[test]
    fn test_preprocess_bare_flag_is_left_alone() {
        assert_eq!(preprocess(" -e"), " -e");
        assert_eq!(preprocess("-e"), "-e");
    }
}
