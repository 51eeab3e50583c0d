//! Language-model provider implementations for Deckhand.
//!
//! All providers implement the `deckhand_core::Provider` trait. The
//! Anthropic Messages API is the only backend the agent needs.

pub mod anthropic;

pub use anthropic::AnthropicProvider;
