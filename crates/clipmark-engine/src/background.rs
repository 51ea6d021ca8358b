//! The extension's background worker: the single writer to clip storage.

use crate::repository::ClipRepository;
use clipmark_common::protocol::{RuntimeMessage, SaveResponse};
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct Background {
    repository: Arc<ClipRepository>,
}

impl Background {
    pub fn new(repository: Arc<ClipRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &ClipRepository {
        &self.repository
    }

    pub async fn handle(&self, message: RuntimeMessage) -> SaveResponse {
        match message {
            RuntimeMessage::SaveSelectedText { data } => {
                match self.repository.save_selection(data).await {
                    Ok(_) => SaveResponse { success: true },
                    Err(e) => {
                        warn!("Failed to save selection: {}", e);
                        SaveResponse { success: false }
                    }
                }
            }
        }
    }
}
