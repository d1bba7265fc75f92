use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::domain::{ChatMessage, DomainError};

/// Ordered, finite, single-use sequence of response fragments.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, DomainError>> + Send>>;

/// Sends a conversation to a hosted completion service and streams the reply.
///
/// Implementors own transport, authentication and wire framing; callers only
/// see text fragments in arrival order.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Model name requests are issued against.
    fn model(&self) -> &str;

    /// Issue exactly one streamed completion request for `messages`.
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<FragmentStream, DomainError>;
}
