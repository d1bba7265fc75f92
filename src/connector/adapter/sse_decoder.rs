use crate::domain::DomainError;

/// One meaningful line of a server-sent event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Data(String),
    /// The `data: [DONE]` sentinel.
    Done,
}

/// Incremental decoder for `text/event-stream` bodies.
///
/// Network chunks may end anywhere, including inside a line or a multi-byte
/// character; bytes are held until a full line is available. Only `data:`
/// fields are surfaced, everything else (`event:`, `id:`, comments, blank
/// separators) is dropped. A complete line that is not valid UTF-8 is a
/// protocol error.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and return every event completed by them.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<SseEvent>, DomainError> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = Self::parse_line(&line)? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Flush a final line that was not newline-terminated.
    pub fn finish(&mut self) -> Result<Vec<SseEvent>, DomainError> {
        let rest = std::mem::take(&mut self.buffer);
        Ok(Self::parse_line(&rest)?.into_iter().collect())
    }

    fn parse_line(raw: &[u8]) -> Result<Option<SseEvent>, DomainError> {
        let line = std::str::from_utf8(raw)
            .map_err(|e| DomainError::protocol(format!("stream line is not valid UTF-8: {}", e)))?;
        let line = line.trim_end_matches(['\n', '\r']);

        let Some(data) = line.strip_prefix("data:") else {
            return Ok(None);
        };
        let data = data.strip_prefix(' ').unwrap_or(data);
        if data.is_empty() {
            return Ok(None);
        }
        if data.trim() == "[DONE]" {
            return Ok(Some(SseEvent::Done));
        }
        Ok(Some(SseEvent::Data(data.to_string())))
    }
}
