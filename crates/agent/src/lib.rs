//! The conversation driver for Deckhand.
//!
//! The agent runs a bounded **call → dispatch → observe** cycle:
//!
//! 1. **Seed** the transcript with workflow instructions and the user's prompt
//! 2. **Call the model** with the transcript and the tool catalog
//! 3. **Dispatch** each requested operation in order and append its result
//! 4. **Stop** as soon as `finalize_document` succeeds
//!
//! If the model stalls after adding slides it is nudged to finalize; if the
//! iteration budget runs out with a document in hand, the driver finalizes it
//! itself and flags the output.

pub mod loop_runner;
pub mod prompt;

#[cfg(test)]
mod test_helpers;

pub use loop_runner::{AgentLoop, GenerationOutput};
