use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, Instrument};

use canon_core::traits::IDurableStore;
use canon_core::SourceKind;
use canon_observability::load_span;
use canon_observability::tracing_setup::events;
use canon_resilience::SafeOperation;

use super::{ISourceLoader, LoadedSource};

/// Loads candidates from JSON files under the entities directory of the
/// durable store.
///
/// Each file holds one payload object or an array of them. A file that
/// cannot be read or parsed is rejected whole; the source stays available.
pub struct DurableLoader {
    store: Arc<dyn IDurableStore>,
    entities_dir: String,
}

impl DurableLoader {
    pub fn new(store: Arc<dyn IDurableStore>, entities_dir: impl Into<String>) -> Self {
        Self {
            store,
            entities_dir: entities_dir.into(),
        }
    }
}

#[async_trait]
impl ISourceLoader for DurableLoader {
    fn source(&self) -> SourceKind {
        SourceKind::Secondary
    }

    async fn load(&self, safe: &SafeOperation, now: DateTime<Utc>) -> LoadedSource {
        let span = load_span!(SourceKind::Secondary);
        async {
            let store = &self.store;
            let dir = self.entities_dir.as_str();
            let files = safe
                .run(store.as_ref(), "secondary.list_files", None, |_cancel| async move {
                    store.list_files(dir).await.map(Some)
                })
                .await;

            let Some(files) = files else {
                events::source_unavailable(store.name(), "entities directory could not be listed");
                return LoadedSource::unavailable(SourceKind::Secondary);
            };

            let mut payloads = Vec::new();
            let mut unreadable = Vec::new();
            for path in files.iter().filter(|p| p.ends_with(".json")) {
                let contents = safe
                    .run(store.as_ref(), "secondary.read_file", None, |_cancel| async move {
                        store.read_file(path).await.map(Some)
                    })
                    .await;
                let Some(contents) = contents else {
                    unreadable.push((path.clone(), "file could not be read".to_string()));
                    continue;
                };
                match serde_json::from_str::<serde_json::Value>(&contents) {
                    Ok(serde_json::Value::Array(items)) => payloads.extend(items),
                    Ok(item) => payloads.push(item),
                    Err(e) => unreadable.push((path.clone(), format!("malformed JSON: {e}"))),
                }
            }
            debug!(files = files.len(), payloads = payloads.len(), "entity files read");

            let mut loaded = LoadedSource::from_payloads(SourceKind::Secondary, payloads, now);
            for (path, reason) in unreadable {
                loaded.reject(&path, reason);
            }
            info!(
                candidates = loaded.candidates.len(),
                rejections = loaded.rejections.len(),
                "secondary source loaded"
            );
            loaded
        }
        .instrument(span)
        .await
    }
}
