//! Scripted provider and response builders for driver tests.

use deckhand_core::error::ProviderError;
use deckhand_core::message::MessageToolCall;
use deckhand_core::provider::{Provider, ProviderRequest, ProviderResponse, ResponseBlock, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A provider that replays scripted replies and records every request.
///
/// Once the script runs out it keeps answering with a text-only reply, so
/// budget tests do not need to pad the script.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(text_response("(no scripted reply)")))
    }
}

fn response(blocks: Vec<ResponseBlock>) -> ProviderResponse {
    let stop_reason = if blocks.iter().any(|b| matches!(b, ResponseBlock::ToolUse { .. })) {
        "tool_use"
    } else {
        "end_turn"
    };
    ProviderResponse {
        id: "msg_mock".into(),
        blocks,
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
        stop_reason: Some(stop_reason.into()),
    }
}

/// A reply with a single text block.
pub fn text_response(text: &str) -> ProviderResponse {
    response(vec![text_block(text)])
}

/// A reply consisting only of operation requests.
pub fn tool_response(calls: Vec<MessageToolCall>) -> ProviderResponse {
    response(calls.into_iter().map(tool_block).collect())
}

/// A reply with arbitrary interleaved blocks.
pub fn mixed_response(blocks: Vec<ResponseBlock>) -> ProviderResponse {
    response(blocks)
}

pub fn text_block(text: &str) -> ResponseBlock {
    ResponseBlock::Text { text: text.into() }
}

pub fn tool_block(call: MessageToolCall) -> ResponseBlock {
    ResponseBlock::ToolUse { call }
}

pub fn call(id: &str, name: &str, arguments: &str) -> MessageToolCall {
    MessageToolCall {
        id: id.into(),
        name: name.into(),
        arguments: arguments.into(),
    }
}
