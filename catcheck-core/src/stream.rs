//! Typed analysis stream on top of the SSE decoder.
//!
//! The backend sends one `data:` event per analyzed row and a final
//! `event: done`. A per-row failure is a data event whose JSON carries
//! `"status": "error"`; it is surfaced as [`StreamItem::Failure`] and the
//! stream keeps going.

use std::collections::VecDeque;

use futures::stream::{BoxStream, StreamExt};
use serde_json::Value;

use crate::analysis::AnalysisResult;
use crate::sse::{SseDecoder, SseEvent};
use crate::{Error, Result};

const DONE_EVENT: &str = "done";

#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    /// One analyzed row.
    Result(Box<AnalysisResult>),
    /// A row the backend failed to analyze.
    Failure {
        message: String,
        row_index: Option<usize>,
    },
    /// Terminal event; nothing follows it.
    Done,
}

/// Maps one decoded event to a stream item.
pub fn classify(event: &SseEvent) -> Result<StreamItem> {
    match event.event.as_deref() {
        Some(DONE_EVENT) => return Ok(StreamItem::Done),
        Some("error") => {
            return Ok(StreamItem::Failure {
                message: event.data.clone(),
                row_index: None,
            })
        }
        _ => {}
    }

    let value: Value = serde_json::from_str(&event.data)?;
    if value.get("status").and_then(Value::as_str) == Some("error") {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("Unknown analysis error")
            .to_owned();
        let row_index = value
            .get("row_index")
            .and_then(Value::as_u64)
            .map(|i| i as usize);
        return Ok(StreamItem::Failure { message, row_index });
    }
    Ok(StreamItem::Result(Box::new(serde_json::from_value(value)?)))
}

/// Pull-based reader over an analysis response body.
pub struct AnalysisStream {
    body: BoxStream<'static, Result<Vec<u8>>>,
    decoder: SseDecoder,
    queued: VecDeque<SseEvent>,
    body_closed: bool,
    finished: bool,
}

impl AnalysisStream {
    pub fn from_response(response: reqwest::Response) -> Self {
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(Error::from))
            .boxed();
        Self::from_chunks(body)
    }

    /// Builds a stream from raw body chunks.
    pub fn from_chunks(body: BoxStream<'static, Result<Vec<u8>>>) -> Self {
        Self {
            body,
            decoder: SseDecoder::new(),
            queued: VecDeque::new(),
            body_closed: false,
            finished: false,
        }
    }

    /// Next item, or `None` once `Done` has been returned or the stream
    /// failed.
    ///
    /// A body that closes before the `done` event yields one `Error::Stream`.
    pub async fn next_item(&mut self) -> Option<Result<StreamItem>> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(event) = self.queued.pop_front() {
                let item = classify(&event);
                match &item {
                    Ok(StreamItem::Done) => self.finished = true,
                    Err(e) => tracing::warn!("undecodable analysis event: {}", e),
                    _ => {}
                }
                return Some(item);
            }

            if self.body_closed {
                if let Some(event) = self.decoder.finish() {
                    self.queued.push_back(event);
                    continue;
                }
                self.finished = true;
                return Some(Err(Error::stream(
                    "connection closed before the analysis finished",
                )));
            }

            match self.body.next().await {
                Some(Ok(chunk)) => self.queued.extend(self.decoder.push(&chunk)),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => self.body_closed = true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    fn chunks(parts: &[&str]) -> BoxStream<'static, Result<Vec<u8>>> {
        let owned: Vec<Result<Vec<u8>>> = parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        stream::iter(owned).boxed()
    }

    async fn collect(mut s: AnalysisStream) -> Vec<Result<StreamItem>> {
        let mut items = Vec::new();
        while let Some(item) = s.next_item().await {
            items.push(item);
        }
        items
    }

    #[test]
    fn error_payload_becomes_failure() {
        let event = SseEvent {
            event: None,
            data: r#"{"status":"error","message":"Analysis failed for product: X","row_index":4}"#.into(),
        };
        assert_eq!(
            classify(&event).unwrap(),
            StreamItem::Failure {
                message: "Analysis failed for product: X".into(),
                row_index: Some(4),
            }
        );
    }

    #[test]
    fn done_event_ignores_data() {
        let event = SseEvent {
            event: Some("done".into()),
            data: "Analysis completed successfully".into(),
        };
        assert_eq!(classify(&event).unwrap(), StreamItem::Done);
    }

    #[tokio::test]
    async fn yields_results_then_done() {
        let body = chunks(&[
            r#"data: {"status":"completed","row_index":0,"product_name":"Chair","#,
            r#""product_description":{"original":"a","improved":"b","changes":[]}}"#,
            "\n\nevent: done\ndata: Analysis completed successfully\n\n",
            "data: {\"ignored\": true}\n\n",
        ]);
        let items = collect(AnalysisStream::from_chunks(body)).await;
        assert_eq!(items.len(), 2);
        match &items[0] {
            Ok(StreamItem::Result(result)) => {
                assert_eq!(result.product_name.as_str(), "Chair");
                assert_eq!(result.row_index, Some(0));
            }
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(matches!(items[1], Ok(StreamItem::Done)));
    }

    #[tokio::test]
    async fn early_close_is_a_stream_error() {
        let body = chunks(&["data: {\"status\":\"error\",\"message\":\"boom\"}\n\n"]);
        let items = collect(AnalysisStream::from_chunks(body)).await;
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Ok(StreamItem::Failure { .. })));
        assert!(matches!(items[1], Err(Error::Stream { .. })));
    }
}
