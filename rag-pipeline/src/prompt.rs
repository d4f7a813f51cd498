//! Fixed two-message prompt for the compliance review. The markers below are
//! the output contract callers scan for: one line per satisfied point, one
//! per missing or violated point, one citing the applicable regulation.

pub const POSITIVE_MARKER: &str = "(✔)";
pub const NEGATIVE_MARKER: &str = "(X)";
pub const REFERENCE_MARKER: &str = "(-)";

/// Responses are pinned to Indonesian regardless of the language of the
/// uploaded contract; the reference corpus is Indonesian labor law.
const RESPONSE_LANGUAGE: &str = "Indonesian";

pub fn system_prompt(topic: &str, law_context: &str) -> String {
    format!(
        "You are a legal compliance reviewer for employment contracts. Review and verify \
the submitted contract clauses, identifying potential issues, inconsistencies, and \
discrepancies.

When responding, organize the information as outlined below:

{topic}:
- {POSITIVE_MARKER} [Description of the positive aspect]
- {NEGATIVE_MARKER} [Description of the negative or missing aspect]
- {REFERENCE_MARKER} References to applicable laws or regulations if necessary.

This is the source of the applicable law about {topic}: {law_context}."
    )
}

pub fn user_prompt(topic: &str, contract_context: &str) -> String {
    format!(
        "Please review this {topic} contract based on the knowledge you have.
Provide all responses in {RESPONSE_LANGUAGE}.
The contract: {contract_context}."
    )
}
