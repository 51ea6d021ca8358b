//! A tab running as its own task.
//!
//! UI requests arrive over an mpsc inbox; the loop also wakes at the next
//! temporary-highlight deadline. Saves produced by any frame go to the
//! [`Background`].

use crate::background::Background;
use clipmark_common::protocol::{PageMessage, SaveResponse, TextResponse};
use clipmark_core::{FrameId, Tab};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Tab runtime has shut down")]
    Closed,
}

type TabFn = Box<dyn FnOnce(&mut Tab) + Send>;

enum Envelope {
    Dispatch {
        message: PageMessage,
        reply: Option<oneshot::Sender<Vec<TextResponse>>>,
    },
    Capture {
        frame: FrameId,
        created_at: u64,
        reply: oneshot::Sender<Vec<SaveResponse>>,
    },
    With(TabFn),
}

pub struct TabRuntime {
    tab: Tab,
    background: Background,
    inbox: mpsc::Receiver<Envelope>,
}

/// Sending side of a running tab. Dropping every handle stops the task.
#[derive(Clone)]
pub struct TabHandle {
    tx: mpsc::Sender<Envelope>,
}

impl TabRuntime {
    pub fn spawn(tab: Tab, background: Background) -> (TabHandle, JoinHandle<Tab>) {
        let (tx, inbox) = mpsc::channel(100);
        let runtime = Self {
            tab,
            background,
            inbox,
        };
        (TabHandle { tx }, tokio::spawn(runtime.run()))
    }

    async fn run(mut self) -> Tab {
        info!("Tab runtime started");
        loop {
            let deadline = self.tab.next_deadline().map(Instant::from_std);
            tokio::select! {
                envelope = self.inbox.recv() => match envelope {
                    Some(envelope) => self.apply(envelope).await,
                    None => break,
                },
                _ = sleep_until(deadline) => {
                    debug!("Highlight deadline reached");
                    self.tab.expire(Instant::now().into_std());
                }
            }
        }
        info!("Tab runtime stopped");
        self.tab
    }

    async fn apply(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::Dispatch { message, reply } => {
                let answers = self.tab.dispatch(&message, Instant::now().into_std());
                if let Some(reply) = reply {
                    let _ = reply.send(answers);
                }
            }
            Envelope::Capture {
                frame,
                created_at,
                reply,
            } => {
                let mut responses = Vec::new();
                for message in self.tab.capture(frame, created_at) {
                    responses.push(self.background.handle(message).await);
                }
                let _ = reply.send(responses);
            }
            Envelope::With(f) => f(&mut self.tab),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl TabHandle {
    /// Broadcast a request to every frame and wait for their answers.
    pub async fn request(&self, message: PageMessage) -> Result<Vec<TextResponse>, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Envelope::Dispatch {
            message,
            reply: Some(reply),
        })
        .await?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    /// Broadcast without waiting for answers.
    pub async fn notify(&self, message: PageMessage) -> Result<(), RuntimeError> {
        self.send(Envelope::Dispatch {
            message,
            reply: None,
        })
        .await
    }

    /// Click the floating button in `frame`.
    pub async fn capture(&self, frame: FrameId, created_at: u64) -> Result<Vec<SaveResponse>, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.send(Envelope::Capture {
            frame,
            created_at,
            reply,
        })
        .await?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    /// Run `f` against the tab inside its task.
    pub async fn with<R, F>(&self, f: F) -> Result<R, RuntimeError>
    where
        R: Send + 'static,
        F: FnOnce(&mut Tab) -> R + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        self.send(Envelope::With(Box::new(move |tab: &mut Tab| {
            let _ = reply.send(f(tab));
        })))
        .await?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    async fn send(&self, envelope: Envelope) -> Result<(), RuntimeError> {
        self.tx.send(envelope).await.map_err(|_| RuntimeError::Closed)
    }
}
