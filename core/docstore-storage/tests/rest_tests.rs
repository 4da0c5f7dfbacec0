use docstore_storage::{KindQuery, QueryStream, RemoteStore, RestConfig, RestStore, StoreError};
use docstore_types::{EntityKey, KeyId, PropertyMap, TypedValue};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn store_for(server: &MockServer) -> RestStore {
    RestStore::new(RestConfig::new("proj").with_endpoint(server.uri())).unwrap()
}

fn journey(id: &str, title: &str) -> serde_json::Value {
    json!({
        "entity": {
            "key": {"partitionId": {"projectId": "proj", "namespaceId": "ns"},
                    "path": [{"kind": "Journey", "id": id}]},
            "properties": {"title": {"stringValue": title}}
        },
        "cursor": "c"
    })
}

// ── Config ──────────────────────────────────────────────────────

#[test]
fn config_defaults() {
    let cfg = RestConfig::new("proj");
    assert_eq!(cfg.endpoint, "https://datastore.googleapis.com");
    assert_eq!(cfg.project_id, "proj");
    assert!(cfg.access_token.is_none());
    assert_eq!(cfg.timeout_secs, 60);
}

#[test]
fn config_serde_skips_token() {
    let cfg = RestConfig::new("proj").with_access_token("secret");
    let text = serde_json::to_string(&cfg).unwrap();
    assert!(!text.contains("secret"));
    let back: RestConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back.project_id, "proj");
    assert!(back.access_token.is_none());
}

// ── runQuery ────────────────────────────────────────────────────

#[tokio::test]
async fn run_query_decodes_batch_and_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/proj:runQuery"))
        .and(body_partial_json(json!({
            "partitionId": {"projectId": "proj", "namespaceId": "ns"},
            "query": {"kind": [{"name": "Journey"}]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batch": {
                "entityResults": [journey("1", "a"), journey("2", "b")],
                "endCursor": "CUR",
                "moreResults": "NOT_FINISHED"
            }
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let batch = store
        .run_query(&KindQuery::new("Journey", "ns"), None)
        .await
        .unwrap();
    assert_eq!(batch.entities.len(), 2);
    assert_eq!(batch.entities[0].key.id, Some(KeyId::Id(1)));
    assert_eq!(
        batch.entities[1].properties.get("title"),
        Some(&TypedValue::String("b".into()))
    );
    assert_eq!(batch.next_cursor.as_deref(), Some("CUR"));
}

#[tokio::test]
async fn stream_follows_cursor_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/proj:runQuery"))
        .and(body_partial_json(json!({"query": {"startCursor": "CUR"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batch": {
                "entityResults": [journey("3", "c")],
                "endCursor": "END",
                "moreResults": "NO_MORE_RESULTS"
            }
        })))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/proj:runQuery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batch": {
                "entityResults": [journey("1", "a"), journey("2", "b")],
                "endCursor": "CUR",
                "moreResults": "NOT_FINISHED"
            }
        })))
        .mount(&server)
        .await;

    let store = store_for(&server);
    let all = QueryStream::new(&store, KindQuery::new("Journey", "ns"))
        .collect_all()
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].key.id, Some(KeyId::Id(3)));
}

#[tokio::test]
async fn empty_batch_without_results_member() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/proj:runQuery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batch": {"moreResults": "NO_MORE_RESULTS"}
        })))
        .mount(&server)
        .await;

    let batch = store_for(&server)
        .run_query(&KindQuery::new("Journey", ""), None)
        .await
        .unwrap();
    assert!(batch.entities.is_empty());
    assert!(batch.next_cursor.is_none());
}

#[tokio::test]
async fn http_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("denied"))
        .mount(&server)
        .await;

    let err = store_for(&server)
        .run_query(&KindQuery::new("Journey", ""), None)
        .await
        .unwrap_err();
    match err {
        StoreError::Http { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "denied");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn bearer_token_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"found": []})))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestStore::new(
        RestConfig::new("proj")
            .with_endpoint(server.uri())
            .with_access_token("tok"),
    )
    .unwrap();
    let found = store
        .get(&EntityKey::with_id("Journey", 1, ""))
        .await
        .unwrap();
    assert!(found.is_none());
}

// ── lookup / commit ─────────────────────────────────────────────

#[tokio::test]
async fn lookup_returns_found_entity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/proj:lookup"))
        .and(body_partial_json(json!({
            "keys": [{"path": [{"kind": "Journey", "id": "1"}]}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "found": [journey("1", "a")]
        })))
        .mount(&server)
        .await;

    let found = store_for(&server)
        .get(&EntityKey::with_id("Journey", 1, "ns"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.key.namespace, "ns");
}

#[tokio::test]
async fn commit_upserts_and_returns_allocated_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/proj:commit"))
        .and(body_partial_json(json!({
            "mode": "NON_TRANSACTIONAL",
            "mutations": [{"upsert": {"key": {"path": [{"kind": "Journey"}]}}}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mutationResults": [{"key": {
                "partitionId": {"projectId": "proj"},
                "path": [{"kind": "Journey", "id": "5629499534213120"}]
            }}]
        })))
        .mount(&server)
        .await;

    let mut props = PropertyMap::new();
    props.insert("n".into(), TypedValue::Integer(1));
    let key = store_for(&server)
        .put(&EntityKey::incomplete("Journey", ""), &props)
        .await
        .unwrap();
    assert_eq!(key.id, Some(KeyId::Id(5_629_499_534_213_120)));
}

#[tokio::test]
async fn commit_of_complete_key_echoes_input() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/proj:commit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mutationResults": [{"version": "7"}]
        })))
        .mount(&server)
        .await;

    let key = EntityKey::with_name("Journey", "a", "ns");
    let stored = store_for(&server)
        .put(&key, &PropertyMap::new())
        .await
        .unwrap();
    assert_eq!(stored, key);
}

#[tokio::test]
async fn unsupported_value_cannot_be_committed() {
    let server = MockServer::start().await;
    let mut props = PropertyMap::new();
    props.insert(
        "loc".into(),
        TypedValue::Unsupported {
            tag: "geoPointValue".into(),
        },
    );
    let err = store_for(&server)
        .put(&EntityKey::with_id("Journey", 1, ""), &props)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Codec(_)));
}
