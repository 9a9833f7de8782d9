//! System instructions for the extraction calls.

/// Instruction for the one-shot extraction endpoint.
pub const ONESHOT_INSTRUCTION: &str = "You are a visa application intake assistant. \
Read the applicant's message and extract their full name, date of birth, passport number \
and nationality. Respond with a single JSON object that conforms exactly to the provided \
schema: dates use YYYY-MM-DD, no additional fields, no commentary. If a required detail \
is genuinely missing from the message, make no attempt to invent it.";

/// Instruction for the streaming endpoint.
///
/// Kept deliberately shorter than the one-shot instruction: incremental
/// output is shown to the applicant while they wait, so brevity matters more
/// than exhaustive guidance.
pub const STREAM_INSTRUCTION: &str = "Extract the applicant's full name, date of birth \
(YYYY-MM-DD), passport number and nationality from the message. Answer with JSON \
matching the schema only.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_instruction_is_shorter_than_oneshot() {
        assert!(STREAM_INSTRUCTION.len() < ONESHOT_INSTRUCTION.len());
        assert_ne!(STREAM_INSTRUCTION, ONESHOT_INSTRUCTION);
    }
}
