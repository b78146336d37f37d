use crate::ProviderError;
use bytes::Bytes;
use futures_util::Stream;
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Turns the payload of one SSE `data:` line into zero or more items.
///
/// Implementations keep whatever state they need between lines (for example
/// partially assembled content blocks).
pub trait SseEventParser {
    type Item;

    fn parse_data(&mut self, data: &str) -> Result<Vec<Self::Item>, ProviderError>;
}

/// SSE (Server-Sent Events) stream parser that buffers incomplete lines
/// across HTTP chunks and queues every item a chunk produces.
pub struct BufferedSseParser<S, P: SseEventParser> {
    inner: S,
    parser: P,
    buffer: Vec<u8>,
    pending: VecDeque<Result<P::Item, ProviderError>>,
    finished: bool,
}

impl<S, E, P> BufferedSseParser<S, P>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
    P: SseEventParser,
{
    pub fn new(stream: S, parser: P) -> Self {
        Self {
            inner: stream,
            parser,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            finished: false,
        }
    }

    fn process_buffer(&mut self) {
        while let Some(newline_pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            self.process_line(line.trim());
        }
    }

    fn process_line(&mut self, line: &str) {
        // Skip blank separators, comments and `event:` lines; the payload carries its own type
        if line.is_empty() || line.starts_with(':') {
            return;
        }

        let Some(data) = line
            .strip_prefix("data: ")
            .or_else(|| line.strip_prefix("data:"))
        else {
            return;
        };

        if data == "[DONE]" {
            return;
        }

        match self.parser.parse_data(data) {
            Ok(items) => self.pending.extend(items.into_iter().map(Ok)),
            Err(e) => self.pending.push_back(Err(e)),
        }
    }
}

impl<S, E, P> Stream for BufferedSseParser<S, P>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
    P: SseEventParser + Unpin,
    P::Item: Unpin,
{
    type Item = Result<P::Item, ProviderError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(item) = this.pending.pop_front() {
                return Poll::Ready(Some(item));
            }

            if this.finished {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffer.extend_from_slice(&bytes);
                    this.process_buffer();
                }
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(ProviderError::Transport(e.to_string()))));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    // A final line may arrive without its trailing newline
                    if !this.buffer.is_empty() {
                        let rest: Vec<u8> = std::mem::take(&mut this.buffer);
                        let line = String::from_utf8_lossy(&rest).into_owned();
                        this.process_line(line.trim());
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
