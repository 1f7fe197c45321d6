use std::{fs, future::Future, pin::Pin, sync::Arc};

use task_store::{
    DistanceKind, EmbeddingsProvider, IndexBackend, TaskStore, TaskStoreConfig, TaskStoreError,
};

/// Maps a few keywords onto fixed axes so distances are predictable.
struct KeywordEmbedder;

impl EmbeddingsProvider for KeywordEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, TaskStoreError>> + Send + 'a>> {
        Box::pin(async move {
            let t = text.to_lowercase();
            Ok(vec![
                if t.contains("test") { 1.0 } else { 0.0 },
                if t.contains("server") { 1.0 } else { 0.0 },
                if t.contains("train") { 1.0 } else { 0.0 },
                0.1,
            ])
        })
    }
}

fn flat_cfg(dir: &std::path::Path) -> TaskStoreConfig {
    let mut cfg = TaskStoreConfig::new_default("", "");
    cfg.backend = IndexBackend::Flat;
    cfg.distance = DistanceKind::Cosine;
    cfg.flat_index_path = dir.join("index.jsonl");
    cfg.tasks_jsonl = Some(dir.join("tasks.jsonl"));
    cfg
}

#[tokio::test]
async fn ingest_then_query_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("tasks.jsonl"),
        concat!(
            r#"{"contract_id":"C-1","tasks":["Develop a software test plan","Run acceptance tests"]}"#,
            "\n",
            r#"{"text":"Maintain web servers","contract_id":"C-2"}"#,
            "\n",
            r#"{"text":"Train help desk staff","contract_id":"C-3"}"#,
            "\n",
            r#"{"text":"Maintain web servers","contract_id":"C-2"}"#,
            "\n",
        ),
    )
    .unwrap();

    let store = TaskStore::from_config(flat_cfg(dir.path()), Arc::new(KeywordEmbedder)).unwrap();
    let report = store.ingest_default().await.unwrap();
    assert_eq!(report.read, 5);
    assert_eq!(report.unique, 4);
    assert_eq!(report.indexed, 4);

    // A fresh store reads the persisted index.
    let reopened =
        TaskStore::from_config(flat_cfg(dir.path()), Arc::new(KeywordEmbedder)).unwrap();
    let hits = reopened.similar_tasks("write a test strategy", 2).await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.fragment.contract_id == "C-1"));
    assert!(hits[0].distance <= hits[1].distance);
}

#[tokio::test]
async fn missing_default_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = flat_cfg(dir.path());
    cfg.tasks_jsonl = None;
    let store = TaskStore::from_config(cfg, Arc::new(KeywordEmbedder)).unwrap();
    assert!(matches!(
        store.ingest_default().await,
        Err(TaskStoreError::Config(_))
    ));
}
