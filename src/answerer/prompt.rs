//! The fixed grounding prompt.

/// The exact string returned for questions the context cannot answer.
///
/// The prompt instructs the model to reply with this verbatim; the
/// pipeline also returns it directly when retrieval produces no usable
/// context at all.
pub const OUT_OF_CONTEXT_ANSWER: &str =
    "I do not have the information needed to answer your question.";

/// Prompt template enforcing answer-only-from-context behavior.
const PROMPT_TEMPLATE: &str = r#"CONTEXT:
{context}

RULES:
- Answer only based on the CONTEXT.
- If the information is not explicitly in the CONTEXT, answer:
  "I do not have the information needed to answer your question."
- Never invent or use outside knowledge.
- Never offer opinions or interpretations beyond what is written.

EXAMPLES OF OUT-OF-CONTEXT QUESTIONS:
Question: "What is the capital of France?"
Answer: "I do not have the information needed to answer your question."

Question: "How many customers do we have in 2024?"
Answer: "I do not have the information needed to answer your question."

Question: "Do you think this is good or bad?"
Answer: "I do not have the information needed to answer your question."

USER QUESTION:
{question}

ANSWER THE "USER QUESTION"
"#;

/// Interpolates the assembled context and the verbatim question into the
/// template. The question is never reformatted or summarized.
pub fn build_prompt(context: &str, question: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{context}", context)
        .replace("{question}", question)
}
