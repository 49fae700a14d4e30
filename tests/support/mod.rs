use std::sync::{Arc, Mutex};

use clichat::chat::ChatStreamer;
use clichat::render::Renderer;
use litellm_api::{CancellationSignal, ChatRequest, ChatStream, LiteLlmError, StreamEvent};
use tokio::sync::mpsc;

pub fn fragment(text: &str) -> StreamEvent {
    StreamEvent::Fragment(text.to_string())
}

pub fn completed() -> StreamEvent {
    StreamEvent::Completed { skipped_lines: 0 }
}

enum ScriptedOutcome {
    Events(Vec<StreamEvent>),
    OpenError(LiteLlmError),
}

/// Streamer that replays a scripted event sequence exactly once and records
/// every request it was handed.
pub struct ScriptedStreamer {
    outcome: Mutex<Option<ScriptedOutcome>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedStreamer {
    pub fn events(events: Vec<StreamEvent>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(Some(ScriptedOutcome::Events(events))),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn open_error(error: LiteLlmError) -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(Some(ScriptedOutcome::OpenError(error))),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn seen_requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

impl ChatStreamer for ScriptedStreamer {
    async fn open_stream(
        &self,
        request: &ChatRequest,
        _cancellation: Option<&CancellationSignal>,
    ) -> Result<ChatStream, LiteLlmError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        match self.outcome.lock().expect("outcome lock").take() {
            Some(ScriptedOutcome::Events(events)) => {
                let (sender, receiver) = mpsc::channel(events.len().max(1));
                for event in events {
                    sender
                        .try_send(event)
                        .expect("scripted channel has capacity for every event");
                }
                Ok(ChatStream::from_receiver(receiver))
            }
            Some(ScriptedOutcome::OpenError(error)) => Err(error),
            None => panic!("scripted stream should be opened exactly once"),
        }
    }
}

/// Renderer that records rendered fragments behind a shared handle.
#[derive(Clone, Default)]
pub struct SharedRenderer {
    fragments: Arc<Mutex<Vec<String>>>,
}

impl SharedRenderer {
    pub fn rendered(&self) -> Vec<String> {
        self.fragments.lock().expect("fragments lock").clone()
    }
}

impl Renderer for SharedRenderer {
    fn render_fragment(&mut self, fragment: &str) -> std::io::Result<()> {
        self.fragments
            .lock()
            .expect("fragments lock")
            .push(fragment.to_string());
        Ok(())
    }
}
