use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, Instrument};

use canon_core::traits::IAuthoritativeSource;
use canon_core::SourceKind;
use canon_observability::load_span;
use canon_observability::tracing_setup::events;
use canon_resilience::SafeOperation;

use super::{ISourceLoader, LoadedSource};

/// Loads candidates from the authoritative in-process source.
pub struct PrimaryLoader {
    source: Arc<dyn IAuthoritativeSource>,
}

impl PrimaryLoader {
    pub fn new(source: Arc<dyn IAuthoritativeSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl ISourceLoader for PrimaryLoader {
    fn source(&self) -> SourceKind {
        SourceKind::Primary
    }

    async fn load(&self, safe: &SafeOperation, now: DateTime<Utc>) -> LoadedSource {
        let span = load_span!(SourceKind::Primary);
        async {
            let source = &self.source;
            let payloads = safe
                .run(source.as_ref(), "primary.get_all", None, |_cancel| async move {
                    source.get_all().await.map(Some)
                })
                .await;

            let Some(payloads) = payloads else {
                events::source_unavailable(source.name(), "get_all failed or source not ready");
                return LoadedSource::unavailable(SourceKind::Primary);
            };

            let loaded = LoadedSource::from_payloads(SourceKind::Primary, payloads, now);
            info!(
                candidates = loaded.candidates.len(),
                rejections = loaded.rejections.len(),
                "primary source loaded"
            );
            loaded
        }
        .instrument(span)
        .await
    }
}
