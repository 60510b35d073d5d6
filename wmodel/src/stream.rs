//! Streaming event contracts and the in-memory stream used by tests.
//!
//! ```rust
//! use wmodel::{BoxedEventStream, StreamEvent, VecEventStream};
//!
//! let stream = VecEventStream::new(vec![Ok(StreamEvent::TextDelta("hello".into()))]);
//! let _boxed: BoxedEventStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::CompletionError;

/// One incremental tool-call delta. The model assigns every fragment to a
/// stream `index`; `id` and `name` typically arrive on the first fragment for
/// an index, `arguments` accumulate across fragments by concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallFragment {
    pub index: u32,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

impl ToolCallFragment {
    pub fn opening(index: u32, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            index,
            id: Some(id.into()),
            name: Some(name.into()),
            arguments: None,
        }
    }

    pub fn arguments(index: u32, fragment: impl Into<String>) -> Self {
        Self {
            index,
            id: None,
            name: None,
            arguments: Some(fragment.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    TextDelta(String),
    ToolCall(ToolCallFragment),
    Finished(FinishReason),
}

/// Completion stream contract.
///
/// Invariants for consumers:
/// - The sequence is lazy, finite, and non-restartable.
/// - `TextDelta` and `ToolCall` may appear zero or more times, in source order.
/// - At most one `Finished` arrives, after all related deltas.
/// - Once the stream yields `None`, it must not yield additional items.
pub trait CompletionEventStream: Stream<Item = Result<StreamEvent, CompletionError>> + Send {}

impl<T> CompletionEventStream for T where
    T: Stream<Item = Result<StreamEvent, CompletionError>> + Send
{
}

pub type BoxedEventStream<'a> = Pin<Box<dyn CompletionEventStream + 'a>>;

#[derive(Debug)]
pub struct VecEventStream {
    events: VecDeque<Result<StreamEvent, CompletionError>>,
}

impl VecEventStream {
    pub fn new(events: Vec<Result<StreamEvent, CompletionError>>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

impl Stream for VecEventStream {
    type Item = Result<StreamEvent, CompletionError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<StreamEvent, CompletionError>>> {
        Poll::Ready(self.events.pop_front())
    }
}
