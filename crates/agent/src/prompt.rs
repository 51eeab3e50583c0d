//! Fixed text the driver puts into every transcript.

/// Workflow instructions sent as the system prompt.
pub const SYSTEM_PROMPT: &str = "\
You are an expert agent that builds slide presentations with the tools provided.

Your task is to:
1. Create the presentation with initialize_document
2. Add slides one by one with insert_slide
3. Optionally review the deck with inspect_document
4. Optionally improve slides with refine_slide
5. Share the deck with finalize_document when you are done

Guidelines:
- Create 5-10 comprehensive slides
- The first slide is a title slide (TITLE layout)
- Use the TITLE_AND_BODY layout for content slides
- Keep content informative and well organized, with a logical flow between slides
- Review your work before finalizing if you want to improve it
- Always call finalize_document as your last action

Think step by step and use the tools available to you.";

/// Appended when the model stops calling tools after slides exist.
pub const FINALIZE_NUDGE: &str =
    "Please finalize the presentation using the finalize_document tool.";

/// Attached to the output when the driver had to finalize on its own.
pub const AUTO_FINALIZE_WARNING: &str =
    "Max iterations reached, presentation finalized automatically";

/// The first user turn.
pub fn user_turn(prompt: &str) -> String {
    format!("Create a presentation about: {prompt}")
}
