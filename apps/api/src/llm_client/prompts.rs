// Shared prompt fragments. Each service that calls the model keeps its own
// prompts.rs alongside it; this file only holds cross-cutting instructions.

/// Fragment that enforces a bare JSON reply.
pub const JSON_ONLY_INSTRUCTION: &str = "Output is STRICTLY JSON: a single JSON object, \
    no preamble, no postscript, no explanations.";

/// Rule for missing values, shared by every extraction prompt.
pub const NULL_CONVENTION_INSTRUCTION: &str = "Missing list fields MUST use []. \
    Missing single-value fields MUST use null.";
