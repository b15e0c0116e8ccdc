//! Fixed prompts for the reasoning pipeline stages.

/// System prompt for the self-critique stage.
pub const CRITIQUE_REVIEWER_PROMPT: &str =
    "You are a critical reviewer examining a prior answer for accuracy and completeness.";

/// System prompt for the iterative verification stage.
pub const VERIFICATION_REVIEWER_PROMPT: &str =
    "You are an expert analyst using iterative reasoning to refine a complex answer.";

const VERIFICATION_CYCLE_INSTRUCTIONS: &str = "\
Work through explicit reasoning cycles:

**Thought**: [What do you need to determine?]
**Observation**: [What information do you have?]
**Reasoning**: [How does this information help?]
**Conclusion**: [What can you determine?]

Repeat the cycle at least two or three times, showing each iteration, and \
examine missing considerations, alternative interpretations, and practical \
implications.";

/// User prompt asking the model to review its own initial answer.
pub fn self_critique_prompt(query: &str, initial_answer: &str) -> String {
    format!(
        "You previously answered this query:\n\n\
         **Original Query:**\n{query}\n\n\
         **Your Initial Answer:**\n{initial_answer}\n\n\
         Now, critically evaluate your own answer:\n\n\
         1. **Completeness Check**: Did you address all aspects of the query?\n\
         2. **Citation Verification**: Are all citations complete and accurate?\n\
         3. **Logical Soundness**: Are there any gaps or flaws in the reasoning?\n\
         4. **Alternative Views**: What counterarguments or alternative interpretations exist?\n\
         5. **Confidence Assessment**: Rate your confidence (Low/Medium/High) and explain why.\n\n\
         Provide an improved answer that addresses any identified issues. If your \
         initial answer was sound, affirm it and explain why."
    )
}

/// User prompt driving the expert-tier verification pass.
pub fn verification_prompt(query: &str, current_answer: &str) -> String {
    format!(
        "Verify and enhance this analysis.\n\n\
         **Query:** {query}\n\n\
         **Current Answer:** {current_answer}\n\n\
         {VERIFICATION_CYCLE_INSTRUCTIONS}\n\n\
         Provide your final, refined answer."
    )
}
