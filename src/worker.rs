use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;

use crate::client::{ChatClient, ChatRequest};
use crate::conversation::ChatResult;

pub const PROGRESS_STEPS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Progress(String),
    Finished(ChatResult),
    Cancelled,
}

fn progress_text(step: usize, elapsed: Duration) -> String {
    format!(
        "🤖 Thinking... ({}/{}) [{:.2}s]",
        step,
        PROGRESS_STEPS,
        elapsed.as_secs_f64()
    )
}

/// One turn's request. Emits cosmetic progress, then exactly one terminal event.
pub struct RequestWorker {
    client: ChatClient,
    request: ChatRequest,
    progress_interval: Duration,
    cancel: CancellationToken,
}

impl RequestWorker {
    pub fn new(client: ChatClient, request: ChatRequest, progress_interval: Duration) -> Self {
        RequestWorker {
            client,
            request,
            progress_interval,
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancellation only takes effect before the HTTP call starts.
    pub async fn run(self, events: UnboundedSender<WorkerEvent>) {
        let started = Instant::now();

        for step in 1..=PROGRESS_STEPS {
            if self.cancel.is_cancelled() {
                log::info!("Turn cancelled at step {}/{}", step, PROGRESS_STEPS);
                let _ = events.send(WorkerEvent::Cancelled);
                return;
            }

            let _ = events.send(WorkerEvent::Progress(progress_text(step, started.elapsed())));

            tokio::select! {
                _ = tokio::time::sleep(self.progress_interval) => {}
                _ = self.cancel.cancelled() => {
                    log::info!("Turn cancelled at step {}/{}", step, PROGRESS_STEPS);
                    let _ = events.send(WorkerEvent::Cancelled);
                    return;
                }
            }
        }

        let result = match self.client.complete(&self.request).await {
            Ok(content) => ChatResult::from_content(&content),
            Err(e) => {
                log::warn!("Chat request failed: {:#}", e);
                ChatResult::failure(&e)
            }
        };

        log::info!(
            "Turn finished in {:.2}s (thoughts: {} chars, answer: {} chars)",
            started.elapsed().as_secs_f64(),
            result.thoughts.len(),
            result.answer.len()
        );
        let _ = events.send(WorkerEvent::Finished(result));
    }

    /// Runs the worker on its own thread with a private current-thread runtime.
    pub fn spawn(self) -> UnboundedReceiver<WorkerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();

        thread::spawn(move || {
            match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime.block_on(self.run(tx)),
                Err(e) => {
                    let error = anyhow::Error::new(e).context("failed to start worker runtime");
                    log::warn!("{:#}", error);
                    let _ = tx.send(WorkerEvent::Finished(ChatResult::failure(&error)));
                }
            }
        });

        rx
    }
}
