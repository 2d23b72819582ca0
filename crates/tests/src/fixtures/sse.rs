use std::time::Duration;

use futures::{Stream, StreamExt};

/// Reads a `text/event-stream` body frame by frame, skipping comments.
pub struct SseReader<S> {
    stream: S,
    buffer: String,
}

impl<S, B> SseReader<S>
where
    S: Stream<Item = reqwest::Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: String::new(),
        }
    }

    /// The next `data:` payload, or `None` if nothing arrives within `wait`.
    pub async fn next_data(&mut self, wait: Duration) -> Option<String> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            if let Some(pos) = self.buffer.find("\n\n") {
                let frame: String = self.buffer.drain(..pos + 2).collect();
                let data = frame.lines().find_map(|line| {
                    line.strip_prefix("data:").map(|d| d.trim_start().to_string())
                });
                match data {
                    Some(data) => return Some(data),
                    None => continue,
                }
            }

            match tokio::time::timeout_at(deadline, self.stream.next()).await {
                Ok(Some(Ok(chunk))) => self.buffer.push_str(&String::from_utf8_lossy(chunk.as_ref())),
                _ => return None,
            }
        }
    }
}
