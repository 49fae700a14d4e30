use std::future::Future;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::time::Duration;

use futures_util::StreamExt;
use log::warn;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Response};
use tokio::sync::mpsc;

use crate::config::LiteLlmConfig;
use crate::error::{parse_error_message, LiteLlmError};
use crate::events::StreamEvent;
use crate::payload::{ChatRequest, ModelInfo, ModelsResponse};
use crate::retry::{is_retryable_http_error, retry_delay, MAX_RETRIES};
use crate::sse::{EventLineParser, StreamFrame};
use crate::url::{chat_completions_url, models_url};

/// Optional cancellation signal shared across request and stream loops.
pub type CancellationSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Bounded hand-off capacity between the stream producer and its consumer.
const FRAGMENT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug)]
pub struct LiteLlmClient {
    http: Client,
    config: LiteLlmConfig,
}

/// Single-consumer handle over one streaming chat response.
///
/// Events arrive in provider-emitted order and end with exactly one terminal
/// event. `next_event` returning `None` means the producer went away without
/// a terminal; callers should treat that as a protocol failure.
#[derive(Debug)]
pub struct ChatStream {
    events: mpsc::Receiver<StreamEvent>,
}

impl ChatStream {
    /// Wraps an already-populated receiver.
    ///
    /// The normal path is [`LiteLlmClient::stream_chat`]; alternate producers
    /// (scripted streams, replays) can hand off their own event sequence.
    #[must_use]
    pub fn from_receiver(events: mpsc::Receiver<StreamEvent>) -> Self {
        Self { events }
    }

    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.recv().await
    }
}

impl LiteLlmClient {
    pub fn new(config: LiteLlmConfig) -> Result<Self, LiteLlmError> {
        let http = Client::builder().build().map_err(LiteLlmError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &LiteLlmConfig {
        &self.config
    }

    fn base_headers(&self) -> Result<HeaderMap, LiteLlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = self
            .config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            let bearer = format!("Bearer {api_key}");
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&bearer)
                    .map_err(|_| LiteLlmError::InvalidHeader("authorization"))?,
            );
        }

        if let Some(user_agent) = self
            .config
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            headers.insert(
                USER_AGENT,
                HeaderValue::from_str(user_agent)
                    .map_err(|_| LiteLlmError::InvalidHeader("user-agent"))?,
            );
        }

        Ok(headers)
    }

    pub fn build_chat_request(
        &self,
        request: &ChatRequest,
    ) -> Result<reqwest::RequestBuilder, LiteLlmError> {
        let mut headers = self.base_headers()?;
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let payload = request_with_transport_defaults(request);
        Ok(self
            .http
            .post(chat_completions_url(&self.config.base_url))
            .headers(headers)
            .json(&payload))
    }

    /// Fetch the gateway's model catalog.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, LiteLlmError> {
        let mut builder = self
            .http
            .get(models_url(&self.config.base_url))
            .headers(self.base_headers()?);
        if let Some(timeout) = self.config.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(LiteLlmError::from)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LiteLlmError::Status {
                status,
                message: parse_error_message(status, &body),
            });
        }

        let payload = response
            .json::<ModelsResponse>()
            .await
            .map_err(LiteLlmError::from)?;
        Ok(payload.data)
    }

    pub async fn send_with_retry(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<Response, LiteLlmError> {
        let mut last_status = None;
        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if is_cancelled(cancellation) {
                return Err(LiteLlmError::Cancelled);
            }

            let response = self.build_chat_request(request)?.send();
            let response = await_or_cancel(response, cancellation)
                .await?
                .map_err(LiteLlmError::from);

            match response {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    last_status = Some(status);
                    let body = await_or_cancel(response.text(), cancellation)
                        .await?
                        .unwrap_or_default();
                    let message = parse_error_message(status, &body);
                    last_error = Some(message.clone());

                    if attempt < MAX_RETRIES && is_retryable_http_error(status.as_u16(), &message) {
                        await_or_cancel(tokio::time::sleep(retry_delay(attempt)), cancellation)
                            .await?;
                        continue;
                    }

                    return Err(LiteLlmError::Status { status, message });
                }
                Err(error) => {
                    last_error = Some(error.to_string());
                    if attempt < MAX_RETRIES {
                        await_or_cancel(tokio::time::sleep(retry_delay(attempt)), cancellation)
                            .await?;
                        continue;
                    }
                }
            }
        }

        Err(LiteLlmError::RetryExhausted {
            status: last_status,
            last_error,
        })
    }

    /// Opens a streaming chat completion.
    ///
    /// Connection failures and non-success statuses yield a single error
    /// before any fragment. On success a producer task pumps the response
    /// body into a bounded channel; the returned stream delivers fragments
    /// in provider order followed by exactly one terminal event. Triggering
    /// the cancellation signal drops the connection promptly and terminates
    /// the stream with [`StreamEvent::Cancelled`].
    pub async fn stream_chat(
        &self,
        request: &ChatRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<ChatStream, LiteLlmError> {
        let response = self.send_with_retry(request, cancellation).await?;
        let (events, receiver) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);
        let cancellation = cancellation.map(Arc::clone);

        tokio::spawn(pump_response(response, cancellation, events));

        Ok(ChatStream::from_receiver(receiver))
    }
}

/// The gateway contract is stream-only from this client; the flag is forced
/// regardless of what the caller handed in.
fn request_with_transport_defaults(request: &ChatRequest) -> ChatRequest {
    let mut payload = request.clone();
    payload.stream = true;
    payload
}

enum PumpEnd {
    Completed,
    Cancelled,
    Failed(LiteLlmError),
    ConsumerGone,
}

enum FrameFlow {
    Continue,
    End(PumpEnd),
}

async fn pump_response(
    response: Response,
    cancellation: Option<CancellationSignal>,
    events: mpsc::Sender<StreamEvent>,
) {
    let cancellation = cancellation.as_ref();
    let mut parser = EventLineParser::default();
    let end = pump_frames(response, cancellation, &events, &mut parser).await;

    let skipped_lines = parser.skipped_lines();
    if skipped_lines > 0 {
        warn!("stream skipped {skipped_lines} malformed event line(s)");
    }

    let terminal = match end {
        PumpEnd::Completed => StreamEvent::Completed { skipped_lines },
        PumpEnd::Cancelled => StreamEvent::Cancelled,
        PumpEnd::Failed(error) => StreamEvent::Failed(error),
        PumpEnd::ConsumerGone => return,
    };
    let _ = events.send(terminal).await;
}

async fn pump_frames(
    response: Response,
    cancellation: Option<&CancellationSignal>,
    events: &mpsc::Sender<StreamEvent>,
    parser: &mut EventLineParser,
) -> PumpEnd {
    let mut bytes = response.bytes_stream();

    loop {
        let chunk = match await_or_cancel(bytes.next(), cancellation).await {
            Err(_) => return PumpEnd::Cancelled,
            Ok(None) => break,
            Ok(Some(Err(error))) => return PumpEnd::Failed(error.into()),
            Ok(Some(Ok(chunk))) => chunk,
        };

        match forward_frames(parser.feed(&chunk), cancellation, events).await {
            FrameFlow::Continue => {}
            FrameFlow::End(end) => return end,
        }
    }

    // EOF without the [DONE] sentinel still counts as a normal end of stream.
    match forward_frames(parser.finish(), cancellation, events).await {
        FrameFlow::Continue => PumpEnd::Completed,
        FrameFlow::End(end) => end,
    }
}

async fn forward_frames(
    frames: Vec<StreamFrame>,
    cancellation: Option<&CancellationSignal>,
    events: &mpsc::Sender<StreamEvent>,
) -> FrameFlow {
    for frame in frames {
        match frame {
            StreamFrame::Done => return FrameFlow::End(PumpEnd::Completed),
            StreamFrame::Delta(text) => {
                match await_or_cancel(events.send(StreamEvent::Fragment(text)), cancellation).await
                {
                    Err(_) => return FrameFlow::End(PumpEnd::Cancelled),
                    Ok(Err(_)) => return FrameFlow::End(PumpEnd::ConsumerGone),
                    Ok(Ok(())) => {}
                }
            }
        }
    }

    FrameFlow::Continue
}

fn is_cancelled(cancel: Option<&CancellationSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

async fn await_or_cancel<F>(
    future: F,
    cancellation: Option<&CancellationSignal>,
) -> Result<F::Output, LiteLlmError>
where
    F: Future,
{
    if cancellation.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancellation) {
            return Err(LiteLlmError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancellation) {
                return Err(LiteLlmError::Cancelled);
            }
            return Ok(output);
        }
    }
}
