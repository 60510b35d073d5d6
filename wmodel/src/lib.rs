//! Completion-model boundary: wire messages, streaming events, and clients.

mod client;
mod error;
mod stream;
mod wire;

#[cfg(feature = "client-openai")]
mod openai;

pub mod prelude {
    pub use crate::{
        BoxedEventStream, ClientFuture, CompletionClient, CompletionError, CompletionErrorKind,
        CompletionEventStream, CompletionRequest, FinishReason, StreamEvent, ToolCallFragment,
        ToolDefinition, VecEventStream, WireMessage, WireRole, WireToolCall,
    };

    #[cfg(feature = "client-openai")]
    pub use crate::{OpenAiClient, OpenAiHttpTransport, OpenAiTransport};
}

pub use client::{ClientFuture, CompletionClient, CompletionRequest, ToolDefinition};
pub use error::{CompletionError, CompletionErrorKind};
pub use stream::{
    BoxedEventStream, CompletionEventStream, FinishReason, StreamEvent, ToolCallFragment,
    VecEventStream,
};
pub use wire::{WireMessage, WireRole, WireToolCall};

#[cfg(feature = "client-openai")]
pub use openai::{
    OpenAiApiMessage, OpenAiApiRequest, OpenAiApiTool, OpenAiClient, OpenAiHttpTransport,
    OpenAiTransport,
};
