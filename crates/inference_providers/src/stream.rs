//! Streaming session for a single model round

use crate::{ContentBlock, FinalMessage, ProviderError, StreamEvent};
use futures_core::Stream;
use std::collections::BTreeMap;
use std::pin::Pin;
use tokio_stream::StreamExt;

/// Boxed stream of provider events
pub type EventStream = Pin<Box<dyn Stream<Item = Result<StreamEvent, ProviderError>> + Send>>;

/// One round's streaming session.
///
/// Events are pulled with [`MessageStream::next_event`]; once the caller is
/// done, [`MessageStream::final_message`] drains anything left and returns the
/// aggregated message. Dropping the session drops the underlying connection.
pub struct MessageStream {
    events: EventStream,
    finalized: BTreeMap<u32, ContentBlock>,
    explicit_final: Option<FinalMessage>,
    exhausted: bool,
}

impl MessageStream {
    /// Session whose final message is assembled from finalized blocks.
    pub fn new(events: EventStream) -> Self {
        Self {
            events,
            finalized: BTreeMap::new(),
            explicit_final: None,
            exhausted: false,
        }
    }

    /// Session whose final message is supplied by the provider.
    pub fn with_final_message(events: EventStream, final_message: FinalMessage) -> Self {
        Self {
            explicit_final: Some(final_message),
            ..Self::new(events)
        }
    }

    pub async fn next_event(&mut self) -> Option<Result<StreamEvent, ProviderError>> {
        if self.exhausted {
            return None;
        }

        match self.events.next().await {
            Some(Ok(event)) => {
                if let StreamEvent::BlockStop {
                    index,
                    block: Some(block),
                } = &event
                {
                    self.finalized.insert(*index, block.clone());
                }
                Some(Ok(event))
            }
            Some(Err(e)) => Some(Err(e)),
            None => {
                self.exhausted = true;
                None
            }
        }
    }

    pub async fn final_message(mut self) -> Result<FinalMessage, ProviderError> {
        while let Some(event) = self.next_event().await {
            event?;
        }

        if let Some(message) = self.explicit_final.take() {
            return Ok(message);
        }

        Ok(FinalMessage::indexed(self.finalized))
    }
}
