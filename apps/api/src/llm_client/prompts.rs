// Shared prompt fragments.
// Each agent defines its own prompts in agents/prompts.rs; this file holds the
// cross-cutting pieces every agent appends.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction that keeps every persona on the shared 0-10 scale.
pub const SCORING_SCALE_INSTRUCTION: &str = "\
    CRITICAL: `score` is a number between 0 and 10 inclusive. \
    Never use a different scale and never return a score outside that range. \
    Prefix a red flag with `critical:` only when it alone should block a hire \
    (dishonesty, misconduct, fabricated experience).";
