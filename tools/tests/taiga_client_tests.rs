//! Taiga client and executor tests against an in-process mock API
//!
//! 1. Client requests (auth, query parameters, bodies)
//! 2. Retry behaviour
//! 3. Executor dispatch
//! 4. Full runs through the orchestrator

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use sprintwright_core::testing::{invocation, ScriptedReasoner};
use sprintwright_core::{
    BudgetConfig, Decision, Orchestrator, Principal, RemoteExecutor, RoleSet, RunRequest, TargetContext,
    ToolArguments, WarningKind,
};
use sprintwright_tools::taiga::NewTask;
use sprintwright_tools::{
    taiga_catalog, ProjectRef, SprintArtifacts, TaigaClient, TaigaError, TaigaExecutor,
};

#[derive(Debug, Clone)]
struct Seen {
    method: &'static str,
    path: String,
    query: HashMap<String, String>,
    auth: Option<String>,
    body: Option<Value>,
}

#[derive(Default)]
struct MockTaiga {
    seen: Mutex<Vec<Seen>>,
    fail_gets: AtomicUsize,
    fail_posts: AtomicUsize,
}

impl MockTaiga {
    fn record(
        &self,
        method: &'static str,
        path: &str,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: Option<Value>,
    ) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.seen.lock().unwrap().push(Seen {
            method,
            path: path.to_string(),
            query,
            auth,
            body,
        });
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    fn hits(&self, method: &str, path: &str) -> usize {
        self.seen()
            .iter()
            .filter(|s| s.method == method && s.path == path)
            .count()
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

type Mock = Arc<MockTaiga>;

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"_error_message": "boom"}))).into_response()
}

async fn project_by_id(State(mock): State<Mock>, Path(id): Path<i64>, headers: HeaderMap) -> Response {
    mock.record("GET", &format!("/projects/{}", id), HashMap::new(), &headers, None);
    Json(json!({"id": id, "name": "Alpha", "slug": "alpha", "total_milestones": 3})).into_response()
}

async fn project_by_slug(
    State(mock): State<Mock>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let slug = query.get("slug").cloned().unwrap_or_default();
    mock.record("GET", "/projects/by_slug", query, &headers, None);
    Json(json!({"id": 1, "name": "Alpha", "slug": slug})).into_response()
}

async fn milestones(
    State(mock): State<Mock>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    mock.record("GET", "/milestones", query, &headers, None);
    if MockTaiga::take_failure(&mock.fail_gets) {
        return server_error();
    }
    Json(json!([
        {"id": 5, "name": "Sprint 5", "project": 1},
        {"id": 6, "name": "Sprint 6", "project": 1}
    ]))
    .into_response()
}

async fn list_stories(
    State(mock): State<Mock>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    mock.record("GET", "/userstories", query, &headers, None);
    Json(json!([
        {"id": 40, "subject": "Search", "project": 1, "milestone": 6, "tags": [["search", null]]}
    ]))
    .into_response()
}

async fn create_story(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("POST", "/userstories", HashMap::new(), &headers, Some(body.clone()));
    if MockTaiga::take_failure(&mock.fail_posts) {
        return server_error();
    }
    let created = json!({
        "id": 500,
        "subject": body["subject"],
        "description": body["description"],
        "project": body["project"],
        "milestone": body.get("milestone").cloned().unwrap_or(Value::Null),
        "tags": body.get("tags").cloned().unwrap_or(json!([]))
    });
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn create_task(State(mock): State<Mock>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("POST", "/tasks", HashMap::new(), &headers, Some(body.clone()));
    if MockTaiga::take_failure(&mock.fail_posts) {
        return server_error();
    }
    let id = 900 + mock.hits("POST", "/tasks") as i64;
    (
        StatusCode::CREATED,
        Json(json!({"id": id, "subject": body["subject"], "user_story": body["user_story"]})),
    )
        .into_response()
}

async fn spawn_mock() -> (Mock, String) {
    let mock: Mock = Arc::new(MockTaiga::default());
    let api = Router::new()
        .route("/projects/by_slug", get(project_by_slug))
        .route("/projects/:id", get(project_by_id))
        .route("/milestones", get(milestones))
        .route("/userstories", get(list_stories).post(create_story))
        .route("/tasks", axum::routing::post(create_task))
        .with_state(mock.clone());
    let app = Router::new().nest("/api/v1", api);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (mock, format!("http://{}/api/v1/", addr))
}

fn client(base_url: &str) -> TaigaClient {
    TaigaClient::new(base_url, "user-token", Duration::from_secs(5)).unwrap()
}

fn args(value: Value) -> ToolArguments {
    value.as_object().cloned().unwrap()
}

// ============================================================================
// CATEGORY 1: Client requests
// ============================================================================

#[tokio::test]
async fn test_a_requests_carry_bearer_token() {
    let (mock, base) = spawn_mock().await;
    let project = client(&base).get_project(&ProjectRef::Id(1)).await.unwrap();

    assert_eq!(project.slug, "alpha");
    let seen = mock.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].path, "/projects/1");
    assert_eq!(seen[0].auth.as_deref(), Some("Bearer user-token"));
}

#[tokio::test]
async fn test_b_project_by_slug_uses_query() {
    let (mock, base) = spawn_mock().await;
    let project = client(&base)
        .get_project(&ProjectRef::Slug("alpha".into()))
        .await
        .unwrap();

    assert_eq!(project.id, 1);
    assert_eq!(mock.seen()[0].query.get("slug").map(String::as_str), Some("alpha"));
}

#[tokio::test]
async fn test_c_find_milestone_is_case_insensitive() {
    let (mock, base) = spawn_mock().await;
    let taiga = client(&base);

    let found = taiga.find_milestone_by_name(1, "  sprint 6 ").await.unwrap();
    assert_eq!(found.map(|m| m.id), Some(6));
    assert_eq!(mock.seen()[0].query.get("project").map(String::as_str), Some("1"));

    let missing = taiga.find_milestone_by_name(1, "Sprint 9").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_d_user_stories_filter_by_milestone() {
    let (mock, base) = spawn_mock().await;
    let stories = client(&base).list_user_stories(1, Some(6)).await.unwrap();

    assert_eq!(stories[0].tags, vec!["search"]);
    let query = &mock.seen()[0].query;
    assert_eq!(query.get("project").map(String::as_str), Some("1"));
    assert_eq!(query.get("milestone").map(String::as_str), Some("6"));
}

#[tokio::test]
async fn test_e_create_task_posts_body() {
    let (mock, base) = spawn_mock().await;
    let task = client(&base)
        .create_task(&NewTask {
            user_story: 40,
            subject: "Add index".into(),
            description: "btree".into(),
            project: None,
        })
        .await
        .unwrap();

    assert_eq!(task.user_story, 40);
    let body = mock.seen()[0].body.clone().unwrap();
    assert_eq!(body, json!({"user_story": 40, "subject": "Add index", "description": "btree"}));
}

// ============================================================================
// CATEGORY 2: Retry behaviour
// ============================================================================

#[tokio::test]
async fn test_f_get_retried_once_on_server_error() {
    let (mock, base) = spawn_mock().await;
    mock.fail_gets.store(1, Ordering::SeqCst);

    let milestones = client(&base).list_milestones(1).await.unwrap();
    assert_eq!(milestones.len(), 2);
    assert_eq!(mock.hits("GET", "/milestones"), 2);
}

#[tokio::test]
async fn test_g_get_gives_up_after_second_failure() {
    let (mock, base) = spawn_mock().await;
    mock.fail_gets.store(5, Ordering::SeqCst);

    let err = client(&base).list_milestones(1).await.unwrap_err();
    assert!(matches!(err, TaigaError::Http { status: 500, .. }));
    assert_eq!(mock.hits("GET", "/milestones"), 2);
}

#[tokio::test]
async fn test_h_post_never_retried() {
    let (mock, base) = spawn_mock().await;
    mock.fail_posts.store(1, Ordering::SeqCst);

    let result = client(&base)
        .create_task(&NewTask {
            user_story: 40,
            subject: "Add index".into(),
            description: String::new(),
            project: None,
        })
        .await;
    assert!(result.is_err());
    assert_eq!(mock.hits("POST", "/tasks"), 1);
}

// ============================================================================
// CATEGORY 3: Executor dispatch
// ============================================================================

#[tokio::test]
async fn test_i_executor_returns_payload() {
    let (_mock, base) = spawn_mock().await;
    let executor = TaigaExecutor::new(client(&base));

    let outcome = executor
        .execute(
            "taiga_get_milestone_by_name",
            &args(json!({"project_id": 1, "sprint_ref": "Sprint 5"})),
        )
        .await;
    assert!(outcome.success);
    assert_eq!(outcome.payload["id"], 5);
}

#[tokio::test]
async fn test_j_executor_reports_missing_milestone() {
    let (_mock, base) = spawn_mock().await;
    let executor = TaigaExecutor::new(client(&base));

    let outcome = executor
        .execute(
            "taiga_get_milestone_by_name",
            &args(json!({"project_id": 1, "sprint_ref": "Sprint 12"})),
        )
        .await;
    assert!(!outcome.success);
    assert!(outcome.error_message().contains("Sprint 12"));
}

#[tokio::test]
async fn test_k_executor_rejects_malformed_arguments_without_request() {
    let (mock, base) = spawn_mock().await;
    let executor = TaigaExecutor::new(client(&base));

    let outcome = executor
        .execute("taiga_list_milestones", &args(json!({"project_id": "one"})))
        .await;
    assert!(!outcome.success);
    assert!(mock.seen().is_empty());
}

#[tokio::test]
async fn test_l_idempotency_key_not_sent_to_taiga() {
    let (mock, base) = spawn_mock().await;
    let executor = TaigaExecutor::new(client(&base));

    let outcome = executor
        .execute(
            "taiga_create_user_story",
            &args(json!({"project_id": 1, "subject": "Checkout", "milestone_id": 6, "idempotency_key": "us-1"})),
        )
        .await;
    assert!(outcome.success);
    let body = mock.seen()[0].body.clone().unwrap();
    assert!(body.get("idempotency_key").is_none());
    assert_eq!(body["milestone"], 6);
}

// ============================================================================
// CATEGORY 4: Full runs
// ============================================================================

fn sprint_planner() -> ScriptedReasoner {
    ScriptedReasoner::new(vec![
        Decision::tool_calls(
            Some("Looking up the sprint".into()),
            vec![invocation(
                "c1",
                "taiga_get_milestone_by_name",
                json!({"project_id": 1, "sprint_ref": "Sprint 6"}),
            )],
        ),
        Decision::tool_calls(
            None,
            vec![invocation(
                "c2",
                "taiga_create_user_story",
                json!({"project_id": 1, "subject": "Checkout", "milestone_id": 6, "idempotency_key": "us-1"}),
            )],
        ),
        Decision::tool_calls(
            None,
            vec![
                invocation(
                    "c3",
                    "taiga_create_task",
                    json!({"user_story_id": 500, "subject": "API", "idempotency_key": "t-1"}),
                ),
                invocation(
                    "c4",
                    "taiga_create_task",
                    json!({"user_story_id": 500, "subject": "API", "idempotency_key": "t-1"}),
                ),
            ],
        ),
        Decision::final_answer("Created Checkout with one task"),
    ])
}

fn run_request(roles: &str) -> RunRequest {
    RunRequest::new(
        Principal::new(3, "lee", RoleSet::parse(roles)),
        TargetContext::new(1, 6),
        "Create a checkout story in Sprint 6 with an API task",
    )
}

#[tokio::test]
async fn test_m_sprint_planning_run() {
    let (mock, base) = spawn_mock().await;
    let orchestrator = Orchestrator::new(
        BudgetConfig::default(),
        Arc::new(taiga_catalog()),
        Arc::new(sprint_planner()),
    );
    let executor = TaigaExecutor::new(client(&base));

    let result = orchestrator.run(run_request("Product Owner"), &executor).await;

    assert!(result.is_completed());
    assert_eq!(result.summary, "Created Checkout with one task");
    assert_eq!(mock.hits("POST", "/userstories"), 1);
    // the repeated task call is replayed, not re-posted
    assert_eq!(mock.hits("POST", "/tasks"), 1);
    assert_eq!(result.usage.replayed_calls, 1);
    assert_eq!(result.usage.write_calls, 2);

    let sprint = SprintArtifacts::from_artifacts(&result.artifacts, Some(6));
    assert_eq!(sprint.user_stories.len(), 1);
    assert_eq!(sprint.user_stories[0].id, 500);
    assert_eq!(sprint.user_stories[0].tasks.len(), 1);
    assert_eq!(sprint.user_stories[0].tasks[0].subject, "API");
}

#[tokio::test]
async fn test_n_developer_cannot_create_stories() {
    let (mock, base) = spawn_mock().await;
    let orchestrator = Orchestrator::new(
        BudgetConfig::default(),
        Arc::new(taiga_catalog()),
        Arc::new(sprint_planner()),
    );
    let executor = TaigaExecutor::new(client(&base));

    let result = orchestrator.run(run_request("developer"), &executor).await;

    assert_eq!(mock.hits("POST", "/userstories"), 0);
    assert!(result.has_warning(WarningKind::UnknownTool));
}
