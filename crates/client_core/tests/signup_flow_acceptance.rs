use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use client_core::{
    controller::{AutoConfirm, UNREGISTER_FAILED_MESSAGE},
    ActionOutcome, ActivitiesController, ClientSettings, RefreshOutcome, StatusKind,
};
use serde::Deserialize;
use shared::{
    domain::{ActivityCatalog, ActivityDetails},
    error::ApiErrorBody,
    protocol::{SignupResponse, UnregisterResponse},
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct Backend {
    activities: Arc<Mutex<ActivityCatalog>>,
    list_hits: Arc<Mutex<u32>>,
}

#[derive(Deserialize)]
struct EmailQuery {
    email: String,
}

type Rejection = (StatusCode, Json<ApiErrorBody>);

fn reject(status: StatusCode, detail: &str) -> Rejection {
    (status, Json(ApiErrorBody::new(detail)))
}

async fn list(State(backend): State<Backend>) -> Json<ActivityCatalog> {
    *backend.list_hits.lock().await += 1;
    Json(backend.activities.lock().await.clone())
}

async fn signup(
    State(backend): State<Backend>,
    Path(activity): Path<String>,
    Query(q): Query<EmailQuery>,
) -> Result<Json<SignupResponse>, Rejection> {
    let mut activities = backend.activities.lock().await;
    let Some(details) = activities.get_mut(&activity) else {
        return Err(reject(StatusCode::NOT_FOUND, "Activity not found"));
    };
    if details.has_participant(&q.email) {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "Student is already signed up",
        ));
    }
    details.participants.push(q.email.clone());
    Ok(Json(SignupResponse {
        message: format!("Signed up {} for {}", q.email, activity),
    }))
}

async fn unregister(
    State(backend): State<Backend>,
    Path(activity): Path<String>,
    Query(q): Query<EmailQuery>,
) -> Result<Json<UnregisterResponse>, Rejection> {
    let mut activities = backend.activities.lock().await;
    let Some(details) = activities.get_mut(&activity) else {
        return Err(reject(StatusCode::NOT_FOUND, "Activity not found"));
    };
    if !details.has_participant(&q.email) {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "Student is not registered for this activity",
        ));
    }
    details.participants.retain(|p| p != &q.email);
    Ok(Json(UnregisterResponse {
        message: Some(format!("Unregistered {} from {}", q.email, activity)),
    }))
}

fn seed() -> ActivityCatalog {
    let mut catalog = ActivityCatalog::new();
    catalog.insert(
        "Chess Club".to_string(),
        ActivityDetails {
            description: "Learn strategies and compete in chess tournaments".to_string(),
            schedule: "Fridays, 3:30 PM - 5:00 PM".to_string(),
            participants: vec![
                "michael@mergington.edu".to_string(),
                "daniel@mergington.edu".to_string(),
            ],
            max_participants: Some(12),
        },
    );
    catalog.insert(
        "Programming Class".to_string(),
        ActivityDetails {
            description: "Learn programming fundamentals and build software projects".to_string(),
            schedule: "Tuesdays and Thursdays, 3:30 PM - 4:30 PM".to_string(),
            participants: vec!["emma@mergington.edu".to_string()],
            max_participants: Some(20),
        },
    );
    catalog.insert(
        "Tennis Club".to_string(),
        ActivityDetails {
            description: "Practice tennis skills and play matches".to_string(),
            schedule: "Saturdays, 10:00 AM - 12:00 PM".to_string(),
            participants: Vec::new(),
            max_participants: Some(10),
        },
    );
    catalog
}

async fn spawn_backend() -> anyhow::Result<(String, Backend)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let backend = Backend {
        activities: Arc::new(Mutex::new(seed())),
        list_hits: Arc::new(Mutex::new(0)),
    };
    let app = Router::new()
        .route("/activities", get(list))
        .route("/activities/:activity/signup", post(signup))
        .route("/activities/:activity/unregister", delete(unregister))
        .with_state(backend.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), backend))
}

fn roster(view: &client_core::ActivityListView, activity: &str) -> Vec<String> {
    view.cards()
        .iter()
        .find(|card| card.name == activity)
        .map(|card| card.rows().iter().map(|r| r.participant.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn signup_and_unregister_round_trip_against_backend() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let settings = ClientSettings {
        message_hide_delay_ms: 60_000,
        ..ClientSettings::default()
    }
    .with_server_url(&server_url);
    let controller = ActivitiesController::from_settings(&settings, Arc::new(AutoConfirm(true)))
        .expect("controller");

    assert_eq!(
        controller.refresh().await,
        RefreshOutcome::Loaded { activities: 3 }
    );
    let view = controller.list_view().await;
    let names: Vec<&str> = view.cards().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Chess Club", "Programming Class", "Tennis Club"]);
    assert_eq!(view.cards()[0].spots_left, Some(10));

    let outcome = controller
        .submit("newstudent@mergington.edu", "Tennis Club")
        .await;
    assert_eq!(
        outcome,
        ActionOutcome::Succeeded("Signed up newstudent@mergington.edu for Tennis Club".into())
    );
    assert_eq!(*backend.list_hits.lock().await, 2);
    assert_eq!(
        roster(&controller.list_view().await, "Tennis Club"),
        vec!["newstudent@mergington.edu"]
    );

    let outcome = controller
        .submit("michael@mergington.edu", "Chess Club")
        .await;
    assert_eq!(
        outcome,
        ActionOutcome::Rejected("Student is already signed up".into())
    );
    let status = controller.status().await;
    assert_eq!(status.kind, StatusKind::Error);
    assert_eq!(status.text, "Student is already signed up");
    assert_eq!(*backend.list_hits.lock().await, 2);

    let outcome = controller
        .submit("student@mergington.edu", "Nonexistent Activity")
        .await;
    assert_eq!(outcome, ActionOutcome::Rejected("Activity not found".into()));

    let outcome = controller
        .remove("emma@mergington.edu", "Programming Class")
        .await;
    assert_eq!(
        outcome,
        ActionOutcome::Succeeded("emma@mergington.edu has been removed from Programming Class".into())
    );
    assert_eq!(*backend.list_hits.lock().await, 3);
    assert!(roster(&controller.list_view().await, "Programming Class").is_empty());

    let outcome = controller
        .remove("emma@mergington.edu", "Programming Class")
        .await;
    assert_eq!(
        outcome,
        ActionOutcome::Rejected("Student is not registered for this activity".into())
    );
    assert_ne!(outcome.message(), Some(UNREGISTER_FAILED_MESSAGE));

    let outcome = controller
        .submit("emma@mergington.edu", "Programming Class")
        .await;
    assert!(outcome.is_success());
    assert_eq!(
        roster(&controller.list_view().await, "Programming Class"),
        vec!["emma@mergington.edu"]
    );

    let html = controller.list_view().await.to_html().expect("render");
    assert_eq!(html.matches("class=\"activity-card\"").count(), 3);
    assert!(html.contains("data-activity=\"Programming Class\""));
}

#[tokio::test]
async fn concurrent_actions_each_refresh_and_last_view_matches_server() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let settings = ClientSettings::default().with_server_url(&server_url);
    let controller = ActivitiesController::from_settings(&settings, Arc::new(AutoConfirm(true)))
        .expect("controller");
    controller.refresh().await;

    let signup = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            controller
                .submit("lucas@mergington.edu", "Tennis Club")
                .await
        })
    };
    let removal = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            controller
                .remove("daniel@mergington.edu", "Chess Club")
                .await
        })
    };
    assert!(signup.await.expect("join").is_success());
    assert!(removal.await.expect("join").is_success());

    controller.refresh().await;
    assert_eq!(*backend.list_hits.lock().await, 4);
    let view = controller.list_view().await;
    assert_eq!(roster(&view, "Tennis Club"), vec!["lucas@mergington.edu"]);
    assert_eq!(roster(&view, "Chess Club"), vec!["michael@mergington.edu"]);
}
