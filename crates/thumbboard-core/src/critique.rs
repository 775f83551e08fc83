//! AI thumbnail critique boundary.
//!
//! Critiques are advisory: they are shown in the sidebar and never touch
//! canvas state.

use crate::model::{Thumbnail, ThumbnailId};
use crate::storage::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CritiqueError {
    #[error("No JSON object in critique response")]
    MissingJson,
    #[error("Malformed critique: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Critique provider failed: {0}")]
    Provider(String),
    #[error("Unknown thumbnail: {0}")]
    UnknownThumbnail(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Critique {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub overall_verdict: String,
}

/// Parse a model reply that may wrap the JSON object in prose or code fences.
pub fn parse_critique(reply: &str) -> Result<Critique, CritiqueError> {
    let start = reply.find('{').ok_or(CritiqueError::MissingJson)?;
    let end = reply.rfind('}').ok_or(CritiqueError::MissingJson)?;
    if end < start {
        return Err(CritiqueError::MissingJson);
    }
    Ok(serde_json::from_str(&reply[start..=end])?)
}

#[cfg(not(target_arch = "wasm32"))]
pub trait CritiqueProvider: Send + Sync {
    fn critique<'a>(&'a self, thumbnail: &'a Thumbnail)
    -> BoxFuture<'a, Result<Critique, CritiqueError>>;
}

#[cfg(target_arch = "wasm32")]
pub trait CritiqueProvider {
    fn critique<'a>(&'a self, thumbnail: &'a Thumbnail)
    -> BoxFuture<'a, Result<Critique, CritiqueError>>;
}

/// Critiques already fetched this session, keyed by thumbnail id.
#[derive(Debug, Clone, Default)]
pub struct CritiqueCache {
    entries: HashMap<ThumbnailId, Critique>,
}

impl CritiqueCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Critique> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: ThumbnailId, critique: Critique) {
        self.entries.insert(id, critique);
    }

    /// Return the cached critique or ask the provider and cache the answer.
    /// Failures are not cached.
    pub async fn get_or_fetch<P: CritiqueProvider + ?Sized>(
        &mut self,
        provider: &P,
        thumbnail: &Thumbnail,
    ) -> Result<Critique, CritiqueError> {
        if let Some(cached) = self.entries.get(&thumbnail.id) {
            return Ok(cached.clone());
        }
        let critique = provider.critique(thumbnail).await?;
        log::info!("Fetched critique for {}", thumbnail.id);
        self.entries.insert(thumbnail.id.clone(), critique.clone());
        Ok(critique)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
