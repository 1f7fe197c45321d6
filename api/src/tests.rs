use std::{future::Future, pin::Pin, sync::Arc};

use ai_llm_service::{LlmModelConfig, LlmProvider, LlmServiceProfiles};
use axum::{
    body::{Bytes, to_bytes},
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Response,
};
use contract_search::{
    Completion, SearchConfig, TaskSearch, TextGenerator,
    prompt::{PromptTemplate, PromptVars},
};
use serde_json::Value;
use task_store::{
    DistanceKind, EmbeddingsProvider, FlatIndex, TaskFragment, TaskStore, TaskStoreConfig,
    TaskStoreError,
};

use crate::{
    core::app_state::AppState,
    routes::{
        index_tasks::index_tasks_route::index_tasks_route,
        search_task::{search_task_request::SearchTaskParams, search_task_route::search_task_route},
    },
};

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
                0.1,
            ])
        })
    }
}

struct CannedGenerator;

impl TextGenerator for CannedGenerator {
    fn complete<'a>(&'a self, template: PromptTemplate, _vars: &'a PromptVars) -> Completion<'a> {
        Box::pin(async move { Ok(format!("{} text", template.id())) })
    }
}

fn profiles() -> Arc<LlmServiceProfiles> {
    let cfg = |model: &str| LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: model.to_string(),
        endpoint: "http://127.0.0.1:9".to_string(),
        api_key: None,
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(1),
    };
    Arc::new(LlmServiceProfiles::new(cfg("chat"), None, cfg("embed"), Some(1)).unwrap())
}

async fn state_with(fragments: Vec<TaskFragment>) -> Arc<AppState> {
    let store = TaskStore::new(
        TaskStoreConfig::new_default("", "contract_tasks"),
        Arc::new(FlatIndex::new(DistanceKind::Cosine)),
        Arc::new(KeywordEmbedder),
    );
    if !fragments.is_empty() {
        store.ingest_fragments(fragments).await.unwrap();
    }
    let search = TaskSearch::new(
        Arc::new(store),
        Arc::new(CannedGenerator),
        SearchConfig::default(),
    );
    Arc::new(AppState::new(Arc::new(search), profiles()))
}

async fn json_body(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn params(query: &str, top_n: Option<usize>) -> Query<SearchTaskParams> {
    Query(SearchTaskParams {
        query: query.to_string(),
        top_n,
    })
}

#[tokio::test]
async fn search_returns_ranked_contracts_in_envelope() {
    let state = state_with(vec![
        TaskFragment::new("Develop a software test plan", "C-1"),
        TaskFragment::new("Maintain web servers", "C-2"),
    ])
    .await;

    let resp = search_task_route(
        State(state),
        HeaderMap::new(),
        Ok(params("test plan", Some(2))),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["success"], true);
    let contracts = body["data"]["contracts"].as_array().unwrap();
    assert_eq!(contracts.len(), 2);
    assert_eq!(contracts[0]["contract_id"], "C-1");
    assert_eq!(contracts[0]["explanation"], "explanation text");
    assert_eq!(body["data"]["final_summary"], "summary text");
}

#[tokio::test]
async fn invalid_top_n_is_a_400() {
    let state = state_with(Vec::new()).await;

    let resp = search_task_route(State(state), HeaderMap::new(), Ok(params("x", Some(0)))).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(body["error"]["retryable"], false);
    assert_eq!(body["error"]["details"][0]["path"], "top_n");
}

#[tokio::test]
async fn empty_index_yields_placeholder_summary() {
    let state = state_with(Vec::new()).await;

    let resp = search_task_route(State(state), HeaderMap::new(), Ok(params("x", None))).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert!(body["data"]["contracts"].as_array().unwrap().is_empty());
    assert_eq!(
        body["data"]["final_summary"],
        contract_search::NO_RESULTS_SUMMARY
    );
}

#[tokio::test]
async fn inline_tasks_are_indexed_and_searchable() {
    let state = state_with(Vec::new()).await;
    let body = Bytes::from_static(
        br#"{"tasks":[{"contract_id":"C-9","tasks":["Run regression tests"," "]},{"text":"Patch servers","contract_id":"C-8"}]}"#,
    );

    let resp = index_tasks_route(State(state.clone()), HeaderMap::new(), body).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let report = json_body(resp).await;
    assert_eq!(report["data"]["indexed"], 2);

    let resp = search_task_route(State(state), HeaderMap::new(), Ok(params("tests", Some(1)))).await;
    let body = json_body(resp).await;
    assert_eq!(body["data"]["contracts"][0]["contract_id"], "C-9");
}

#[tokio::test]
async fn malformed_index_body_is_a_400() {
    let state = state_with(Vec::new()).await;

    let resp = index_tasks_route(State(state), HeaderMap::new(), Bytes::from_static(b"{not json")).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn caller_supplied_path_is_rejected() {
    let state = state_with(Vec::new()).await;
    let body = Bytes::from_static(br#"{"path":"/etc/passwd"}"#);

    let resp = index_tasks_route(State(state.clone()), HeaderMap::new(), body).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["code"], "BAD_REQUEST");
    assert!(state.search.store().similar_tasks("anything", 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_body_without_default_file_is_a_config_error() {
    let state = state_with(Vec::new()).await;

    let resp = index_tasks_route(State(state), HeaderMap::new(), Bytes::new()).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["code"], "CONFIG_ERROR");
}
