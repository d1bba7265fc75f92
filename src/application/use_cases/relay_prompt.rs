use std::io::Write;
use std::sync::Arc;

use futures_util::StreamExt;
use tracing::{debug, info};

use crate::application::CompletionClient;
use crate::domain::{ChatMessage, DomainError, Prompt, RelaySummary};

/// Use case forwarding one prompt to a completion service and echoing the
/// streamed answer.
pub struct RelayPromptUseCase {
    client: Arc<dyn CompletionClient>,
}

impl RelayPromptUseCase {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Send `prompt` as the only message of a new conversation and write
    /// every fragment to `out` as soon as it arrives.
    pub async fn execute<W: Write>(
        &self,
        prompt: &Prompt,
        out: &mut W,
    ) -> Result<RelaySummary, DomainError> {
        debug!(
            "Relaying prompt ({} bytes) to model {}",
            prompt.as_str().len(),
            self.client.model()
        );

        let messages = [ChatMessage::user(prompt.as_str())];
        let mut fragments = self.client.stream_chat(&messages).await?;

        write!(out, "\n--- {} Answer ---\n\n", self.client.model())?;
        out.flush()?;

        let mut summary = RelaySummary::default();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            out.write_all(fragment.as_bytes())?;
            out.flush()?;
            summary.fragments += 1;
            summary.characters += fragment.chars().count();
        }

        out.write_all(b"\n\n")?;
        out.flush()?;

        info!(
            "Stream finished: {} fragments, {} characters",
            summary.fragments, summary.characters
        );
        Ok(summary)
    }
}
