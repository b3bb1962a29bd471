//! NDJSON stream handling for the Ollama chat API.
//!
//! A streaming `/api/chat` response is a sequence of JSON objects, one per
//! line. Every object but the last carries a fragment of the assistant
//! message; the last has `done: true` plus the stop reason and token counts.
//! HTTP chunk boundaries do not line up with object boundaries, so bytes
//! are buffered until a full line is available.

use futures_util::StreamExt;

use codepair_core::llm::provider::EventStream;
use codepair_types::llm::{LlmError, StopReason, StreamEvent, Usage};

use super::client::{check_status, map_send_error};
use super::types::{OllamaChatRequest, OllamaChatResponse};

/// Splits a byte stream into newline-terminated lines.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Add a chunk and return every complete, non-blank line it finished.
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if !line.iter().all(u8::is_ascii_whitespace) {
                lines.push(line);
            }
        }
        lines
    }

    /// Whatever is left once the body ends without a trailing newline.
    pub(crate) fn finish(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.buf);
        if rest.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(rest)
        }
    }
}

/// Translate one NDJSON line into stream events.
pub(crate) fn line_events(line: &[u8]) -> Result<Vec<StreamEvent>, LlmError> {
    let chunk: OllamaChatResponse = serde_json::from_slice(line).map_err(|e| {
        LlmError::Deserialization(format!(
            "malformed stream line '{}': {e}",
            String::from_utf8_lossy(line)
        ))
    })?;

    if let Some(error) = chunk.error {
        return Err(LlmError::Stream(error));
    }

    let mut events = Vec::new();
    if let Some(message) = chunk.message {
        if !message.content.is_empty() {
            events.push(StreamEvent::TextDelta {
                text: message.content,
            });
        }
    }

    if chunk.done {
        let stop_reason = chunk
            .done_reason
            .as_deref()
            .and_then(|r| r.parse::<StopReason>().ok())
            .unwrap_or(StopReason::EndTurn);
        events.push(StreamEvent::MessageDelta { stop_reason });
        events.push(StreamEvent::Usage(Usage {
            input_tokens: chunk.prompt_eval_count.unwrap_or(0),
            output_tokens: chunk.eval_count.unwrap_or(0),
        }));
        events.push(StreamEvent::Done);
    }

    Ok(events)
}

/// Open a streaming `/api/chat` request.
///
/// The returned stream emits `Connected` once the server accepts the
/// request, then `TextDelta`s, then `MessageDelta`, `Usage` and `Done`.
/// A body that ends before the `done` object is reported as an error.
pub fn create_ollama_stream(
    client: reqwest::Client,
    url: String,
    body: OllamaChatRequest,
) -> EventStream {
    Box::pin(async_stream::try_stream! {
        let response = client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error(&url, e))?;
        let response = check_status(response, &body.model).await?;

        yield StreamEvent::Connected;

        let mut bytes = response.bytes_stream();
        let mut lines = LineBuffer::default();
        let mut finished = false;

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| LlmError::Stream(e.to_string()))?;
            for line in lines.push(&chunk) {
                for event in line_events(&line)? {
                    finished |= matches!(event, StreamEvent::Done);
                    yield event;
                }
            }
        }

        if let Some(rest) = lines.finish() {
            for event in line_events(&rest)? {
                finished |= matches!(event, StreamEvent::Done);
                yield event;
            }
        }

        if !finished {
            Err::<(), _>(LlmError::Stream(
                "response ended before the model finished".to_string(),
            ))?;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_buffer_joins_split_lines() {
        let mut buf = LineBuffer::default();
        assert!(buf.push(b"{\"done\":").is_empty());
        let lines = buf.push(b"false}\n{\"done\":true}\n");
        assert_eq!(lines, vec![b"{\"done\":false}".to_vec(), b"{\"done\":true}".to_vec()]);
        assert!(buf.finish().is_none());
    }

    #[test]
    fn test_line_buffer_skips_blank_lines_and_crlf() {
        let mut buf = LineBuffer::default();
        let lines = buf.push(b"\r\n\n{\"a\":1}\r\n  \n");
        assert_eq!(lines, vec![b"{\"a\":1}".to_vec()]);
    }

    #[test]
    fn test_line_buffer_finish_returns_unterminated_tail() {
        let mut buf = LineBuffer::default();
        assert!(buf.push(b"{\"done\":true}").is_empty());
        assert_eq!(buf.finish(), Some(b"{\"done\":true}".to_vec()));
        assert!(buf.finish().is_none());
    }

    #[test]
    fn test_line_events_text_delta() {
        let events = line_events(
            br#"{"model":"m","message":{"role":"assistant","content":"print("},"done":false}"#,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![StreamEvent::TextDelta {
                text: "print(".to_string()
            }]
        );
    }

    #[test]
    fn test_line_events_final_object() {
        let events = line_events(
            br#"{"model":"m","message":{"role":"assistant","content":""},"done":true,"done_reason":"length","prompt_eval_count":26,"eval_count":298}"#,
        )
        .unwrap();
        assert_eq!(
            events,
            vec![
                StreamEvent::MessageDelta {
                    stop_reason: StopReason::MaxTokens
                },
                StreamEvent::Usage(Usage {
                    input_tokens: 26,
                    output_tokens: 298
                }),
                StreamEvent::Done,
            ]
        );
    }

    #[test]
    fn test_line_events_error_object() {
        let err = line_events(br#"{"error":"model runner has unexpectedly stopped"}"#).unwrap_err();
        assert!(matches!(err, LlmError::Stream(msg) if msg.contains("unexpectedly stopped")));
    }

    #[test]
    fn test_line_events_malformed_line() {
        let err = line_events(b"not json").unwrap_err();
        assert!(matches!(err, LlmError::Deserialization(_)));
    }
}
