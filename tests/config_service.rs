//! Integration tests for `ConfigService` over in-memory and failing stores.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use confseal::{
    derive_key, AppCredentials, ConfigError, ConfigRecord, ConfigService, ConfigStore,
    ConfigType, GetConfigOptions, MemoryConfigStore, PayloadCipher, ServiceSettings, StoreError,
    StoreErrorKind, ENC_FIELD,
};
use serde_json::{json, Map, Value};

// ============================================================================
// Helpers
// ============================================================================

const APP_ID: &str = "11111111-1111-1111-1111-111111111111";

fn creds(app_key: &str) -> AppCredentials {
    AppCredentials::new(app_key, APP_ID).expect("valid credentials")
}

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("object literal")
}

/// Seal `data` the way a writer holding `app_key` would.
fn sealed_with(app_key: &str, data: Value) -> Map<String, Value> {
    let key = derive_key(app_key, APP_ID);
    PayloadCipher::from_derived(&key)
        .encrypt(&object(data))
        .expect("encrypt")
}

fn make_service(store: Arc<MemoryConfigStore>) -> ConfigService {
    ConfigService::with_defaults(store, creds("k1"))
}

fn make_service_with_capacity(store: Arc<MemoryConfigStore>, capacity: usize) -> ConfigService {
    let settings = ServiceSettings {
        cache_capacity: capacity,
        ..Default::default()
    };
    ConfigService::new(store, creds("k1"), settings).expect("valid settings")
}

/// Log sink shared between a test and its subscriber.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Install a subscriber writing into this sink for the current thread.
    fn install(&self) -> tracing::subscriber::DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Store whose every call fails with the same error.
struct FailingStore(StoreError);

#[async_trait]
impl ConfigStore for FailingStore {
    async fn fetch_by_key(&self, _: &str, _: bool) -> Result<Option<ConfigRecord>, StoreError> {
        Err(self.0.clone())
    }

    async fn fetch_by_keys(&self, _: &[String], _: bool) -> Result<Vec<ConfigRecord>, StoreError> {
        Err(self.0.clone())
    }

    async fn fetch_by_type(&self, _: ConfigType, _: bool) -> Result<Vec<ConfigRecord>, StoreError> {
        Err(self.0.clone())
    }
}

// ============================================================================
// get_config — store outcomes
// ============================================================================

#[tokio::test]
async fn missing_key_is_not_found() {
    let store = Arc::new(MemoryConfigStore::new());
    let svc = make_service(store);
    let err = svc
        .get_config("nope", GetConfigOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { ref key } if key == "nope"));
    assert_eq!(err.code(), "CONFIG_NOT_FOUND");
}

#[tokio::test]
async fn inactive_record_is_not_found() {
    let store = Arc::new(MemoryConfigStore::new());
    store.upsert(ConfigRecord::new("off", "Off", Map::new()).with_active(false));
    let svc = make_service(store);
    let err = svc
        .get_config("off", GetConfigOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConfigError::NotFound { .. }));
}

#[tokio::test]
async fn store_failure_carries_cause() {
    let store = Arc::new(FailingStore(StoreError::with_kind(
        "connection reset",
        StoreErrorKind::Transient,
    )));
    let svc = ConfigService::with_defaults(store, creds("k1"));
    let err = svc
        .get_config("any", GetConfigOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFIG_GET_FAILED");
    let source = std::error::Error::source(&err).expect("cause attached");
    assert_eq!(source.to_string(), "connection reset");
    match err {
        ConfigError::FetchFailed { source } => assert_eq!(source.kind, StoreErrorKind::Transient),
        other => panic!("expected FetchFailed, got {other:?}"),
    }
}

// ============================================================================
// get_config — decryption
// ============================================================================

#[tokio::test]
async fn sealed_payload_is_opened_end_to_end() {
    let store = Arc::new(MemoryConfigStore::new());
    store.upsert(ConfigRecord::new(
        "flags",
        "Flags",
        sealed_with("k1", json!({ "flag": true })),
    ));
    let svc = make_service(store);
    let record = svc
        .get_config("flags", GetConfigOptions::default())
        .await
        .unwrap();
    assert_eq!(record.data, object(json!({ "flag": true })));
}

#[tokio::test]
async fn foreign_key_payload_fails_open() {
    let store = Arc::new(MemoryConfigStore::new());
    let foreign = sealed_with("k2", json!({ "flag": true }));
    store.upsert(ConfigRecord::new("flags", "Flags", foreign.clone()));
    let svc = make_service(store);
    let record = svc
        .get_config("flags", GetConfigOptions::default())
        .await
        .unwrap();
    assert_eq!(record.data, foreign);
    assert!(svc.is_encrypted(&record.data));
}

#[tokio::test]
async fn malformed_envelope_fails_open_and_is_cached() {
    let store = Arc::new(MemoryConfigStore::new());
    let broken = object(json!({ ENC_FIELD: "enc:v1:deadbeef" }));
    store.upsert(ConfigRecord::new("broken", "Broken", broken.clone()));
    let svc = make_service(store.clone());

    let first = svc
        .get_config("broken", GetConfigOptions::default())
        .await
        .unwrap();
    assert_eq!(first.data, broken);

    let second = svc
        .get_config("broken", GetConfigOptions::default())
        .await
        .unwrap();
    assert_eq!(second.data, broken);
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test]
async fn fail_open_reads_are_logged_with_kind() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let store = Arc::new(MemoryConfigStore::new());
    store.upsert(ConfigRecord::new(
        "foreign_flags",
        "Foreign",
        sealed_with("k2", json!({ "flag": true })),
    ));
    store.upsert(ConfigRecord::new(
        "torn_banner",
        "Torn",
        object(json!({ ENC_FIELD: "enc:v1:deadbeef" })),
    ));
    store.upsert(ConfigRecord::new("legacy_banner", "Legacy", object(json!({ "x": 1 }))));
    let svc = make_service(store);

    svc.get_config("foreign_flags", GetConfigOptions::default())
        .await
        .unwrap();
    svc.get_config("torn_banner", GetConfigOptions::default())
        .await
        .unwrap();
    svc.get_config("legacy_banner", GetConfigOptions::default())
        .await
        .unwrap();

    let output = logs.contents();
    let warnings: Vec<&str> = output.lines().filter(|l| l.contains("WARN")).collect();
    assert_eq!(warnings.len(), 2, "{output}");

    let integrity = warnings
        .iter()
        .find(|l| l.contains("config_key=foreign_flags"))
        .expect("integrity warning");
    assert!(integrity.contains(r#"failure="integrity""#), "{integrity}");

    let format = warnings
        .iter()
        .find(|l| l.contains("config_key=torn_banner"))
        .expect("format warning");
    assert!(format.contains(r#"failure="format""#), "{format}");

    // legacy plaintext is not a failure
    assert!(!warnings.iter().any(|l| l.contains("legacy_banner")));
}

#[tokio::test]
async fn key_derivation_is_logged_once() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let store = Arc::new(MemoryConfigStore::new());
    for k in ["a", "b", "c"] {
        store.upsert(ConfigRecord::new(k, k, sealed_with("k1", json!({ "k": k }))));
    }
    let svc = make_service(store);
    for k in ["a", "b", "c"] {
        svc.get_config(k, GetConfigOptions::bypass_cache())
            .await
            .unwrap();
    }

    let derivations = logs.contents().matches("deriving config key").count();
    assert_eq!(derivations, 1);
}

// ============================================================================
// get_config — caching
// ============================================================================

#[tokio::test]
async fn fresh_hit_skips_store() {
    let store = Arc::new(MemoryConfigStore::new());
    store.upsert(ConfigRecord::new("a", "A", object(json!({ "v": 1 }))));
    let svc = make_service(store.clone());

    svc.get_config("a", GetConfigOptions::default()).await.unwrap();
    svc.get_config("a", GetConfigOptions::default()).await.unwrap();
    assert_eq!(store.fetch_count(), 1);
}

#[tokio::test]
async fn bypassing_cache_always_fetches() {
    let store = Arc::new(MemoryConfigStore::new());
    store.upsert(ConfigRecord::new("a", "A", object(json!({ "v": 1 }))));
    let svc = make_service(store.clone());

    svc.get_config("a", GetConfigOptions::default()).await.unwrap();
    store.upsert(ConfigRecord::new("a", "A", object(json!({ "v": 2 }))));

    let bypassed = svc
        .get_config("a", GetConfigOptions::bypass_cache())
        .await
        .unwrap();
    assert_eq!(bypassed.data["v"], 2);
    assert_eq!(store.fetch_count(), 2);

    // the bypassing read refreshed the cache
    let cached = svc.get_config("a", GetConfigOptions::default()).await.unwrap();
    assert_eq!(cached.data["v"], 2);
    assert_eq!(store.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn stale_entry_is_refetched() {
    let store = Arc::new(MemoryConfigStore::new());
    store.upsert(ConfigRecord::new("a", "A", object(json!({ "v": 1 }))));
    let svc = make_service(store.clone());
    let opts = GetConfigOptions {
        use_cache: true,
        cache_duration: Duration::from_secs(60),
    };

    svc.get_config("a", opts).await.unwrap();
    tokio::time::advance(Duration::from_secs(59)).await;
    svc.get_config("a", opts).await.unwrap();
    assert_eq!(store.fetch_count(), 1);

    tokio::time::advance(Duration::from_secs(1)).await;
    svc.get_config("a", opts).await.unwrap();
    assert_eq!(store.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn callers_may_disagree_on_freshness() {
    let store = Arc::new(MemoryConfigStore::new());
    store.upsert(ConfigRecord::new("a", "A", Map::new()));
    let svc = make_service(store.clone());

    svc.get_config("a", GetConfigOptions::default()).await.unwrap();
    tokio::time::advance(Duration::from_secs(30)).await;

    let patient = GetConfigOptions {
        use_cache: true,
        cache_duration: Duration::from_secs(60),
    };
    svc.get_config("a", patient).await.unwrap();
    assert_eq!(store.fetch_count(), 1);

    let strict = GetConfigOptions {
        use_cache: true,
        cache_duration: Duration::from_secs(10),
    };
    svc.get_config("a", strict).await.unwrap();
    assert_eq!(store.fetch_count(), 2);
}

#[tokio::test]
async fn cache_evicts_oldest_key() {
    let store = Arc::new(MemoryConfigStore::new());
    for k in ["a", "b", "c"] {
        store.upsert(ConfigRecord::new(k, k, Map::new()));
    }
    let svc = make_service_with_capacity(store.clone(), 2);

    for k in ["a", "b", "c"] {
        svc.get_config(k, GetConfigOptions::default()).await.unwrap();
    }
    assert_eq!(svc.cached_len(), 2);
    assert_eq!(store.fetch_count(), 3);

    // "b" and "c" are still cached, "a" was evicted
    svc.get_config("c", GetConfigOptions::default()).await.unwrap();
    svc.get_config("b", GetConfigOptions::default()).await.unwrap();
    assert_eq!(store.fetch_count(), 3);
    svc.get_config("a", GetConfigOptions::default()).await.unwrap();
    assert_eq!(store.fetch_count(), 4);
}

#[tokio::test]
async fn clear_cache_forces_refetch() {
    let store = Arc::new(MemoryConfigStore::new());
    store.upsert(ConfigRecord::new("a", "A", Map::new()));
    store.upsert(ConfigRecord::new("b", "B", Map::new()));
    let svc = make_service(store.clone());

    svc.get_config("a", GetConfigOptions::default()).await.unwrap();
    svc.get_config("b", GetConfigOptions::default()).await.unwrap();

    svc.clear_cache(Some("a"));
    assert_eq!(svc.cached_len(), 1);
    svc.get_config("a", GetConfigOptions::default()).await.unwrap();
    assert_eq!(store.fetch_count(), 3);

    svc.clear_cache(None);
    assert_eq!(svc.cached_len(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reads_share_one_service() {
    let store = Arc::new(MemoryConfigStore::new());
    for i in 0..16 {
        store.upsert(ConfigRecord::new(
            format!("key-{i}"),
            "k",
            sealed_with("k1", json!({ "i": i })),
        ));
    }
    let svc = Arc::new(make_service_with_capacity(store, 8));

    let mut handles = Vec::new();
    for round in 0..4 {
        for i in 0..16 {
            let svc = Arc::clone(&svc);
            handles.push(tokio::spawn(async move {
                let key = format!("key-{}", (i + round) % 16);
                svc.get_config(&key, GetConfigOptions::default()).await
            }));
        }
    }
    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        let expected: usize = record.key.trim_start_matches("key-").parse().unwrap();
        assert_eq!(record.data["i"], expected);
    }
    assert!(svc.cached_len() <= 8);
}

// ============================================================================
// get_config_value / get_config_data
// ============================================================================

#[tokio::test]
async fn value_lookup_and_defaults() {
    let store = Arc::new(MemoryConfigStore::new());
    store.upsert(ConfigRecord::new(
        "llm",
        "LLM",
        sealed_with("k1", json!({ "model": "small", "temperature": 0.5 })),
    ));
    let svc = make_service(store);

    let model = svc.get_config_value("llm", "model", None).await.unwrap();
    assert_eq!(model, Some(json!("small")));

    let missing = svc.get_config_value("llm", "top_p", None).await.unwrap();
    assert_eq!(missing, None);

    let defaulted = svc
        .get_config_value("llm", "top_p", Some(json!(0.9)))
        .await
        .unwrap();
    assert_eq!(defaulted, Some(json!(0.9)));

    let data = svc.get_config_data("llm").await.unwrap();
    assert_eq!(data["temperature"], 0.5);
}

#[tokio::test]
async fn value_default_absorbs_failures() {
    let store = Arc::new(FailingStore(StoreError::new("down")));
    let svc = ConfigService::with_defaults(store, creds("k1"));

    let value = svc
        .get_config_value("llm", "model", Some(json!("fallback")))
        .await
        .unwrap();
    assert_eq!(value, Some(json!("fallback")));

    let err = svc.get_config_value("llm", "model", None).await.unwrap_err();
    assert_eq!(err.code(), "CONFIG_GET_FAILED");

    let empty = Arc::new(MemoryConfigStore::new());
    let svc = make_service(empty);
    let err = svc.get_config_value("llm", "model", None).await.unwrap_err();
    assert_eq!(err.code(), "CONFIG_NOT_FOUND");
}

// ============================================================================
// Batch reads
// ============================================================================

#[tokio::test]
async fn batch_reads_open_each_record_and_skip_cache() {
    let store = Arc::new(MemoryConfigStore::new());
    store.upsert(ConfigRecord::new("plain", "P", object(json!({ "p": 1 }))));
    store.upsert(ConfigRecord::new(
        "sealed",
        "S",
        sealed_with("k1", json!({ "s": 2 })),
    ));
    let foreign = sealed_with("k2", json!({ "f": 3 }));
    store.upsert(ConfigRecord::new("foreign", "F", foreign.clone()));
    let svc = make_service(store.clone());

    let keys = vec!["plain".to_string(), "sealed".to_string(), "foreign".to_string()];
    let records = svc.get_configs(&keys).await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].data, object(json!({ "p": 1 })));
    assert_eq!(records[1].data, object(json!({ "s": 2 })));
    assert_eq!(records[2].data, foreign);
    assert_eq!(svc.cached_len(), 0);

    svc.get_configs(&keys).await.unwrap();
    assert_eq!(store.fetch_count(), 2);
}

#[tokio::test]
async fn batch_by_type_is_opened_and_uncached() {
    let store = Arc::new(MemoryConfigStore::new());
    store.upsert(
        ConfigRecord::new("notice", "N", sealed_with("k1", json!({ "text": "hi" })))
            .with_type(ConfigType::Announcement),
    );
    store.upsert(
        ConfigRecord::new("flag", "F", object(json!({ "on": true })))
            .with_type(ConfigType::FeatureFlag),
    );
    let svc = make_service(store);

    let notices = svc
        .get_configs_by_type(ConfigType::Announcement)
        .await
        .unwrap();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].data["text"], "hi");
    assert_eq!(svc.cached_len(), 0);
}

#[tokio::test]
async fn batch_store_failure_propagates() {
    let store = Arc::new(FailingStore(StoreError::with_kind(
        "permission denied",
        StoreErrorKind::Rejected,
    )));
    let svc = ConfigService::with_defaults(store, creds("k1"));
    let err = svc.get_configs(&["a".to_string()]).await.unwrap_err();
    assert_eq!(err.code(), "CONFIG_GET_FAILED");
    let err = svc
        .get_configs_by_type(ConfigType::Custom)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "CONFIG_GET_FAILED");
}

// ============================================================================
// Writers
// ============================================================================

#[tokio::test]
async fn service_sealed_data_reads_back() {
    let store = Arc::new(MemoryConfigStore::new());
    let svc = make_service(store.clone());
    let sealed = svc
        .encrypt_data(&object(json!({ "endpoint": "https://api.example.com" })))
        .unwrap();
    assert_eq!(sealed.len(), 1);
    store.upsert(ConfigRecord::new("api", "API", sealed).with_type(ConfigType::ApiConfig));

    let data = svc.get_config_data("api").await.unwrap();
    assert_eq!(data["endpoint"], "https://api.example.com");
}
