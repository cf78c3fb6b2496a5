//! Scriptable stand-ins for the primary source, the durable store and the
//! enricher.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use canon_core::errors::{CanonResult, EnrichmentError, SourceError, StorageError};
use canon_core::record::{MasterRecord, RecordExtensions};
use canon_core::traits::{IAuthoritativeSource, IDurableStore, IEnricher, IReadiness};
use canon_storage::InMemoryStore;

/// Primary source serving a fixed payload list.
///
/// Failures are scripted: [`Self::fail_next`] makes the next `n` calls fail,
/// [`Self::set_delay`] makes every call sleep first (useful with a paused
/// tokio clock to trigger timeouts).
#[derive(Debug)]
pub struct FakePrimarySource {
    payloads: Mutex<Vec<Value>>,
    ready: AtomicBool,
    failures_remaining: AtomicU32,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl FakePrimarySource {
    pub fn new(payloads: Vec<Value>) -> Self {
        Self {
            payloads: Mutex::new(payloads),
            ready: AtomicBool::new(true),
            failures_remaining: AtomicU32::new(0),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn shared(payloads: Vec<Value>) -> Arc<Self> {
        Arc::new(Self::new(payloads))
    }

    fn payloads(&self) -> MutexGuard<'_, Vec<Value>> {
        self.payloads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_payloads(&self, payloads: Vec<Value>) {
        *self.payloads() = payloads;
    }

    pub fn push_payload(&self, payload: Value) {
        self.payloads().push(payload);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Fail the next `n` calls.
    pub fn fail_next(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Fail every call until [`Self::recover`].
    pub fn fail_always(&self) {
        self.fail_next(u32::MAX);
    }

    pub fn recover(&self) {
        self.fail_next(0);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Calls that reached `get_all` or `get_by_id`.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn begin_call(&self) -> CanonResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                match n {
                    0 => None,
                    u32::MAX => Some(u32::MAX),
                    n => Some(n - 1),
                }
            })
            .is_ok();
        if failing {
            return Err(SourceError::FetchFailed {
                source_name: self.name().to_string(),
                reason: "scripted failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl IReadiness for FakePrimarySource {
    fn name(&self) -> &str {
        "fake-primary"
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IAuthoritativeSource for FakePrimarySource {
    async fn get_all(&self) -> CanonResult<Vec<Value>> {
        self.begin_call().await?;
        Ok(self.payloads().clone())
    }

    async fn get_by_id(&self, id: &str) -> CanonResult<Option<Value>> {
        self.begin_call().await?;
        Ok(self
            .payloads()
            .iter()
            .find(|p| p.get("id").and_then(Value::as_str) == Some(id))
            .cloned())
    }
}

/// [`InMemoryStore`] with switchable read and write failures.
#[derive(Debug, Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_attempts: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Seed a file, bypassing failure injection.
    ///
    /// # Panics
    /// Panics on an invalid store path.
    pub fn seed(&self, path: &str, contents: &str) {
        self.inner
            .seed(path, contents)
            .unwrap_or_else(|e| panic!("Failed to seed {path}: {e}"));
    }

    /// Seed a file with the JSON encoding of `value`.
    pub fn seed_json(&self, path: &str, value: &Value) {
        self.seed(path, &value.to_string());
    }
}

impl IReadiness for FlakyStore {
    fn name(&self) -> &str {
        "flaky-store"
    }

    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }
}

#[async_trait]
impl IDurableStore for FlakyStore {
    async fn exists(&self, path: &str) -> CanonResult<bool> {
        self.inner.exists(path).await
    }

    async fn read_file(&self, path: &str) -> CanonResult<String> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::ReadFailed {
                path: path.to_string(),
                reason: "injected read failure".to_string(),
            }
            .into());
        }
        self.inner.read_file(path).await
    }

    async fn write_file(&self, path: &str, contents: &str) -> CanonResult<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed {
                path: path.to_string(),
                reason: "injected write failure".to_string(),
            }
            .into());
        }
        self.inner.write_file(path, contents).await
    }

    async fn list_files(&self, dir: &str) -> CanonResult<Vec<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::ReadFailed {
                path: dir.to_string(),
                reason: "injected read failure".to_string(),
            }
            .into());
        }
        self.inner.list_files(dir).await
    }
}

/// Enricher that always fails.
#[derive(Debug, Default)]
pub struct FailingEnricher;

impl IEnricher for FailingEnricher {
    fn enrich(&self, _record: &MasterRecord) -> Result<RecordExtensions, EnrichmentError> {
        Err(EnrichmentError::Failed {
            reason: "scripted enrichment failure".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_failures_run_out() {
        let source = FakePrimarySource::new(vec![serde_json::json!({"id": "a"})]);
        source.fail_next(2);
        assert!(source.get_all().await.is_err());
        assert!(source.get_all().await.is_err());
        assert_eq!(source.get_all().await.unwrap().len(), 1);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn fail_always_until_recovered() {
        let source = FakePrimarySource::empty();
        source.fail_always();
        for _ in 0..5 {
            assert!(source.get_all().await.is_err());
        }
        source.recover();
        assert!(source.get_all().await.is_ok());
    }

    #[tokio::test]
    async fn flaky_store_injects_write_failures() {
        let store = FlakyStore::new();
        store.set_fail_writes(true);
        assert!(store.write_file("a.json", "[]").await.is_err());
        store.set_fail_writes(false);
        store.write_file("a.json", "[]").await.unwrap();
        assert_eq!(store.read_file("a.json").await.unwrap(), "[]");
        assert_eq!(store.write_attempts(), 2);
    }
}
