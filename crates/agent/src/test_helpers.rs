//! Shared test doubles for pipeline tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use groundwire_core::error::{EncoderError, ProviderError, VectorStoreError};
use groundwire_core::message::Message;
use groundwire_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use groundwire_core::vector::{Document, IndexSpec, VectorStore, rank};
use groundwire_core::Encoder;

/// A provider that returns scripted replies in order and records every request.
///
/// Panics if more calls are made than replies provided.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    failure: Option<ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn replies(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fails every call with `err`.
    pub fn failing(err: ProviderError) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            failure: Some(err),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);

        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no more replies"));

        Ok(ProviderResponse {
            message: Message::assistant(reply),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model,
        })
    }
}

/// An encoder that returns a constant-length vector derived from the text length.
pub struct ScriptedEncoder {
    dims: usize,
    failure: Option<EncoderError>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedEncoder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: EncoderError) -> Self {
        Self {
            dims: 0,
            failure: Some(err),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every text encoded so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Encoder for ScriptedEncoder {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EncoderError> {
        self.calls.lock().unwrap().extend(texts.iter().cloned());
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(texts
            .iter()
            .map(|t| vec![t.len() as f32; self.dims])
            .collect())
    }
}

/// A store that returns a fixed ranked list and records every query.
pub struct ScriptedStore {
    docs: Vec<Document>,
    failure: Option<VectorStoreError>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl ScriptedStore {
    pub fn with_contents(contents: &[&str]) -> Self {
        let docs = contents
            .iter()
            .enumerate()
            .map(|(i, c)| Document {
                id: format!("doc-{i}"),
                content: c.to_string(),
                score: 0.99 - i as f32 * 0.01,
            })
            .collect();
        Self {
            docs,
            failure: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_contents(&[])
    }

    pub fn failing(err: VectorStoreError) -> Self {
        Self {
            failure: Some(err),
            ..Self::empty()
        }
    }

    /// `(index, top_k)` of every query, in order.
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorStore for ScriptedStore {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn ensure_index(&self, _spec: &IndexSpec) -> Result<(), VectorStoreError> {
        Ok(())
    }

    async fn query(
        &self,
        index: &str,
        _vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<Document>, VectorStoreError> {
        self.queries.lock().unwrap().push((index.to_string(), top_k));
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        Ok(rank(self.docs.clone(), top_k))
    }
}
