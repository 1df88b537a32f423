//! Async driver for the controller
//!
//! Effects become spawned remote calls; their answers come back over an
//! mpsc channel and are applied one at a time, in arrival order, interleaved
//! with incoming intents.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;

use crate::controller::EditorController;
use crate::error::EditorError;
use crate::intent::{Completion, Effect, Intent};
use crate::remote::RemoteStore;

const COMPLETION_CAPACITY: usize = 100;

enum Event {
    Intent(Intent),
    Completion(Completion),
    Closed,
}

/// Runs an [`EditorController`] against a [`RemoteStore`]
#[derive(Debug)]
pub struct EditorRuntime {
    controller: EditorController,
    remote: Arc<dyn RemoteStore>,
    completions_tx: mpsc::Sender<Completion>,
    completions_rx: mpsc::Receiver<Completion>,
    in_flight: usize,
}

impl EditorRuntime {
    /// Create runtime
    #[must_use]
    pub fn new(controller: EditorController, remote: Arc<dyn RemoteStore>) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel(COMPLETION_CAPACITY);
        Self {
            controller,
            remote,
            completions_tx,
            completions_rx,
            in_flight: 0,
        }
    }

    /// Get controller
    #[inline]
    #[must_use]
    pub fn controller(&self) -> &EditorController {
        &self.controller
    }

    /// Get controller mutably
    #[inline]
    pub fn controller_mut(&mut self) -> &mut EditorController {
        &mut self.controller
    }

    /// Remote calls not yet applied
    #[inline]
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Apply an intent and start any remote work it requests
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns whatever [`EditorController::handle`] returns
    pub fn dispatch(&mut self, intent: Intent) -> Result<(), EditorError> {
        let effects = self.controller.handle(intent)?;
        self.execute(effects);
        Ok(())
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            let remote = Arc::clone(&self.remote);
            let tx = self.completions_tx.clone();
            self.in_flight += 1;

            tokio::spawn(async move {
                let completion = match effect {
                    Effect::Fetch { ticket, locale } => {
                        let result = remote.fetch(&locale).await;
                        Completion::Fetched {
                            ticket,
                            locale,
                            result,
                        }
                    }
                    Effect::Push {
                        ticket,
                        locale,
                        document,
                    } => {
                        let result = remote.save(&locale, &document).await;
                        Completion::Pushed {
                            ticket,
                            locale,
                            result,
                        }
                    }
                };
                if tx.send(completion).await.is_err() {
                    tracing::debug!("Runtime dropped before completion arrived");
                }
            });
        }
    }

    fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let effects = self.controller.complete(completion);
        self.execute(effects);
    }

    /// Wait until every outstanding remote call has been applied
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            match self.completions_rx.recv().await {
                Some(completion) => self.apply(completion),
                None => break,
            }
        }
    }

    /// Process intents until the channel closes, then settle
    ///
    /// Intent failures are logged; their status messages stay in the
    /// controller's outbox.
    pub async fn run(&mut self, mut intents: mpsc::Receiver<Intent>) {
        loop {
            let event = tokio::select! {
                intent = intents.recv() => match intent {
                    Some(intent) => Event::Intent(intent),
                    None => Event::Closed,
                },
                Some(completion) = self.completions_rx.recv() => Event::Completion(completion),
            };

            match event {
                Event::Intent(intent) => {
                    if let Err(err) = self.dispatch(intent) {
                        tracing::warn!(error = %err, "Intent failed");
                    }
                }
                Event::Completion(completion) => self.apply(completion),
                Event::Closed => break,
            }
        }
        self.settle().await;
    }

    /// Schema for the active locale
    ///
    /// # Errors
    /// - [`EditorError::NoSession`] if no locale is active
    /// - [`EditorError::Network`] if the remote call fails
    pub async fn fetch_schema(&self) -> Result<Option<Value>, EditorError> {
        let locale = self.controller.locale().ok_or(EditorError::NoSession)?;
        Ok(self.remote.fetch_schema(locale).await?)
    }
}
