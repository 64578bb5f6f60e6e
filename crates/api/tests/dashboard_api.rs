mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, count_rows, create_user, get_auth, post_json_auth, put_json_auth,
    seed_monitoring, TestUser,
};
use serde_json::{json, Value};
use sqlx::PgPool;

const NO_PERMISSIONS: &str = "No permissions to referred object or it does not exist!";

/// A dashboard with one graph widget referencing item 500 and graph 600.
fn cpu_dashboard(name: &str) -> Value {
    json!({
        "name": name,
        "widgets": [{
            "type": "graph",
            "name": "CPU",
            "x": 0, "y": 0, "width": 12, "height": 5,
            "fields": [
                { "type": 6, "name": "graphid", "value": "600" },
                { "type": 4, "name": "itemid", "value": 500 },
                { "type": 0, "name": "source_type", "value": 1 }
            ]
        }]
    })
}

async fn create_dashboard(pool: &PgPool, user: &TestUser, body: Value) -> i64 {
    let response =
        post_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &user.token, &body)
            .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["data"]["dashboard_ids"][0].as_i64().unwrap()
}

async fn fetch_dashboard(pool: &PgPool, user: &TestUser, id: i64) -> Value {
    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/dashboards/{id}"),
        &user.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

async fn widget_field_ids(pool: &PgPool) -> Vec<i64> {
    sqlx::query_scalar("SELECT id FROM widget_field ORDER BY id")
        .fetch_all(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Test: Create returns 201 with ids; get returns widgets with sorted fields
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_then_get_dashboard(pool: PgPool) {
    let user = create_user(&pool, "alice", "user").await;
    seed_monitoring(&pool, &[&user], 2).await;

    let id = create_dashboard(&pool, &user, cpu_dashboard("Servers")).await;
    let dashboard = fetch_dashboard(&pool, &user, id).await;

    assert_eq!(dashboard["name"], "Servers");
    assert_eq!(dashboard["user_id"], user.id);
    assert_eq!(dashboard["private"], true);
    assert_eq!(dashboard["users"], json!([]));
    assert!(dashboard.get("template_id").is_none());

    let widgets = dashboard["widgets"].as_array().unwrap();
    assert_eq!(widgets.len(), 1);
    assert_eq!(widgets[0]["type"], "graph");
    assert_eq!(widgets[0]["width"], 12);
    assert_eq!(
        widgets[0]["fields"],
        json!([
            { "type": 0, "name": "source_type", "value": 1 },
            { "type": 4, "name": "itemid", "value": "500" },
            { "type": 6, "name": "graphid", "value": "600" }
        ])
    );
}

// ---------------------------------------------------------------------------
// Test: A single object and an array are both accepted
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_accepts_a_batch(pool: PgPool) {
    let user = create_user(&pool, "alice", "user").await;
    let app = build_test_app(pool.clone());

    let body = json!([{ "name": "First" }, { "name": "Second", "private": false }]);
    let response = post_json_auth(app, "/api/v1/dashboards", &user.token, &body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let ids = json["data"]["dashboard_ids"].as_array().unwrap();
    assert_eq!(ids.len(), 2);
    assert!(ids[0].as_i64() < ids[1].as_i64());
    assert_eq!(count_rows(&pool, "dashboard").await, 2);
}

// ---------------------------------------------------------------------------
// Test: Overlapping widgets are rejected with a placement error
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn overlapping_widgets_are_rejected(pool: PgPool) {
    let user = create_user(&pool, "alice", "user").await;
    let app = build_test_app(pool.clone());

    let body = json!({
        "name": "Crowded",
        "widgets": [
            { "type": "clock", "x": 0, "y": 0, "width": 4, "height": 4 },
            { "type": "clock", "x": 2, "y": 2, "width": 4, "height": 4 }
        ]
    });
    let response = post_json_auth(app, "/api/v1/dashboards", &user.token, &body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "PLACEMENT_ERROR");
    assert_eq!(count_rows(&pool, "dashboard").await, 0);
}

// ---------------------------------------------------------------------------
// Test: A reference the caller cannot see aborts the whole batch
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn invisible_reference_writes_nothing(pool: PgPool) {
    let user = create_user(&pool, "alice", "user").await;
    seed_monitoring(&pool, &[&user], 2).await;
    let app = build_test_app(pool.clone());

    let body = json!([
        cpu_dashboard("Fine"),
        {
            "name": "Secret",
            "widgets": [{
                "type": "item",
                "fields": [{ "type": 4, "name": "itemid", "value": "900" }]
            }]
        }
    ]);
    let response = post_json_auth(app, "/api/v1/dashboards", &user.token, &body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "REFERENCE_ERROR");
    assert_eq!(json["error"], "Item with ID \"900\" is not available.");

    assert_eq!(count_rows(&pool, "dashboard").await, 0);
    assert_eq!(count_rows(&pool, "widget").await, 0);
    assert_eq!(count_rows(&pool, "widget_field").await, 0);
    assert_eq!(count_rows(&pool, "audit_log").await, 0);
}

// ---------------------------------------------------------------------------
// Test: Dashboard names are unique among user dashboards
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_name_is_rejected(pool: PgPool) {
    let alice = create_user(&pool, "alice", "user").await;
    let bob = create_user(&pool, "bob", "user").await;
    create_dashboard(&pool, &alice, json!({ "name": "Overview" })).await;

    let app = build_test_app(pool.clone());
    let response =
        post_json_auth(app, "/api/v1/dashboards", &bob.token, &json!({ "name": "Overview" }))
            .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Dashboard \"Overview\" already exists.");
}

// ---------------------------------------------------------------------------
// Test: Updating one coordinate touches only that widget attribute
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_moves_a_widget(pool: PgPool) {
    let user = create_user(&pool, "alice", "user").await;
    seed_monitoring(&pool, &[&user], 2).await;
    let id = create_dashboard(&pool, &user, cpu_dashboard("Servers")).await;
    let before = fetch_dashboard(&pool, &user, id).await;
    let widget_id = before["widgets"][0]["widget_id"].as_i64().unwrap();

    let body = json!({
        "dashboard_id": id,
        "widgets": [{ "widget_id": widget_id, "y": 10 }]
    });
    let response =
        put_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &user.token, &body)
            .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["dashboard_ids"], json!([id]));

    let after = fetch_dashboard(&pool, &user, id).await;
    let widget = &after["widgets"][0];
    assert_eq!(widget["widget_id"], widget_id);
    assert_eq!(widget["y"], 10);
    assert_eq!(widget["x"], 0);
    assert_eq!(widget["height"], 5);
    assert_eq!(widget["fields"], before["widgets"][0]["fields"]);
    assert_eq!(after["name"], "Servers");
}

// ---------------------------------------------------------------------------
// Test: Resubmitting the same fields in another order changes no rows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn field_order_does_not_matter(pool: PgPool) {
    let user = create_user(&pool, "alice", "user").await;
    seed_monitoring(&pool, &[&user], 2).await;
    let id = create_dashboard(&pool, &user, cpu_dashboard("Servers")).await;
    let widget_id = fetch_dashboard(&pool, &user, id).await["widgets"][0]["widget_id"]
        .as_i64()
        .unwrap();
    let field_ids = widget_field_ids(&pool).await;

    let body = json!({
        "dashboard_id": id,
        "widgets": [{
            "widget_id": widget_id,
            "fields": [
                { "type": 0, "name": "source_type", "value": "1" },
                { "type": 6, "name": "graphid", "value": 600 },
                { "type": 4, "name": "itemid", "value": "0500" }
            ]
        }]
    });
    let response =
        put_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &user.token, &body)
            .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(widget_field_ids(&pool).await, field_ids);
}

// ---------------------------------------------------------------------------
// Test: An empty field list clears the widget's fields
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_field_list_clears_fields(pool: PgPool) {
    let user = create_user(&pool, "alice", "user").await;
    seed_monitoring(&pool, &[&user], 2).await;
    let id = create_dashboard(&pool, &user, cpu_dashboard("Servers")).await;
    let widget_id = fetch_dashboard(&pool, &user, id).await["widgets"][0]["widget_id"]
        .as_i64()
        .unwrap();

    let body = json!({
        "dashboard_id": id,
        "widgets": [{ "widget_id": widget_id, "fields": [] }]
    });
    let response =
        put_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &user.token, &body)
            .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(count_rows(&pool, "widget").await, 1);
    assert_eq!(count_rows(&pool, "widget_field").await, 0);
}

// ---------------------------------------------------------------------------
// Test: Widgets missing from an update are deleted with their preferences
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn omitted_widgets_are_removed(pool: PgPool) {
    let user = create_user(&pool, "alice", "user").await;
    let body = json!({
        "name": "Clocks",
        "widgets": [
            { "type": "clock", "x": 0 },
            { "type": "clock", "x": 4 }
        ]
    });
    let id = create_dashboard(&pool, &user, body).await;
    let widgets = fetch_dashboard(&pool, &user, id).await["widgets"].clone();
    let keep = widgets[0]["widget_id"].as_i64().unwrap();
    let drop = widgets[1]["widget_id"].as_i64().unwrap();

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/user/widgets/{drop}/refresh-rate"),
        &user.token,
        &json!({ "refresh_rate": 60 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json!({ "dashboard_id": id, "widgets": [{ "widget_id": keep }] });
    let response =
        put_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &user.token, &body)
            .await;
    assert_eq!(response.status(), StatusCode::OK);

    let widgets = fetch_dashboard(&pool, &user, id).await["widgets"].clone();
    assert_eq!(widgets.as_array().unwrap().len(), 1);
    assert_eq!(widgets[0]["widget_id"], keep);
    assert_eq!(count_rows(&pool, "profiles").await, 0);
}

// ---------------------------------------------------------------------------
// Test: A widget id from another dashboard is rejected
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn foreign_widget_id_is_rejected(pool: PgPool) {
    let user = create_user(&pool, "alice", "user").await;
    let first = create_dashboard(
        &pool,
        &user,
        json!({ "name": "First", "widgets": [{ "type": "clock" }] }),
    )
    .await;
    let second = create_dashboard(&pool, &user, json!({ "name": "Second" })).await;
    let widget_id = fetch_dashboard(&pool, &user, first).await["widgets"][0]["widget_id"]
        .as_i64()
        .unwrap();

    let body = json!({ "dashboard_id": second, "widgets": [{ "widget_id": widget_id }] });
    let response =
        put_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &user.token, &body)
            .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(
        json["error"],
        format!("Dashboard \"Second\" has no widget with ID \"{widget_id}\".")
    );
}

// ---------------------------------------------------------------------------
// Test: Private dashboards are hidden from other users
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn private_dashboard_is_not_visible_to_others(pool: PgPool) {
    let alice = create_user(&pool, "alice", "user").await;
    let bob = create_user(&pool, "bob", "user").await;
    let id = create_dashboard(&pool, &alice, json!({ "name": "Mine" })).await;
    create_dashboard(&pool, &alice, json!({ "name": "Ours", "private": false })).await;

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/dashboards/{id}"),
        &bob.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &bob.token).await;
    let json = body_json(response).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ours"]);
}

// ---------------------------------------------------------------------------
// Test: Shares grant access and are replaced on update
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn shared_dashboard_is_editable_by_grantee(pool: PgPool) {
    let alice = create_user(&pool, "alice", "user").await;
    let bob = create_user(&pool, "bob", "user").await;
    let body = json!({
        "name": "Team",
        "users": [{ "user_id": bob.id, "permission": 3 }]
    });
    let id = create_dashboard(&pool, &alice, body).await;

    let body = json!({ "dashboard_id": id, "name": "Team board" });
    let response =
        put_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &bob.token, &body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json!({ "dashboard_id": id, "users": [] });
    let response =
        put_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &alice.token, &body)
            .await;
    assert_eq!(response.status(), StatusCode::OK);

    let dashboard = fetch_dashboard(&pool, &alice, id).await;
    assert_eq!(dashboard["name"], "Team board");
    assert_eq!(dashboard["users"], json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn share_with_unknown_user_is_rejected(pool: PgPool) {
    let alice = create_user(&pool, "alice", "user").await;
    let body = json!({
        "name": "Team",
        "users": [{ "user_id": 999_999, "permission": 2 }]
    });

    let response =
        post_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &alice.token, &body)
            .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "User with ID \"999999\" is not available.");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_owner_is_rejected(pool: PgPool) {
    let admin = create_user(&pool, "root", "super_admin").await;

    let body = json!({ "name": "Ops", "user_id": 999_999 });
    let response =
        post_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &admin.token, &body)
            .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "User with ID \"999999\" is not available.");
    assert_eq!(count_rows(&pool, "dashboard").await, 0);

    let id = create_dashboard(&pool, &admin, json!({ "name": "Ops" })).await;
    let body = json!({ "dashboard_id": id, "user_id": 999_999 });
    let response =
        put_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &admin.token, &body)
            .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "User with ID \"999999\" is not available."
    );
    assert_eq!(fetch_dashboard(&pool, &admin, id).await["user_id"], admin.id);
}

// ---------------------------------------------------------------------------
// Test: Resubmitting shares only touches the rows that changed
// ---------------------------------------------------------------------------

async fn user_share_rows(pool: &PgPool) -> Vec<(i64, i64, i16)> {
    sqlx::query_as("SELECT id, user_id, permission FROM dashboard_user ORDER BY user_id")
        .fetch_all(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn resubmitted_shares_keep_their_rows(pool: PgPool) {
    let alice = create_user(&pool, "alice", "user").await;
    let bob = create_user(&pool, "bob", "user").await;
    let carol = create_user(&pool, "carol", "user").await;
    let body = json!({
        "name": "Team",
        "users": [
            { "user_id": bob.id, "permission": 2 },
            { "user_id": carol.id, "permission": 2 }
        ]
    });
    let id = create_dashboard(&pool, &alice, body).await;
    let before = user_share_rows(&pool).await;
    assert_eq!(before.len(), 2);

    let body = json!({
        "dashboard_id": id,
        "users": [
            { "user_id": carol.id, "permission": 2 },
            { "user_id": bob.id, "permission": 2 }
        ]
    });
    let response =
        put_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &alice.token, &body)
            .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(user_share_rows(&pool).await, before);

    // A permission change rewrites the row in place.
    let body = json!({
        "dashboard_id": id,
        "users": [
            { "user_id": bob.id, "permission": 3 },
            { "user_id": carol.id, "permission": 2 }
        ]
    });
    let response =
        put_json_auth(build_test_app(pool.clone()), "/api/v1/dashboards", &alice.token, &body)
            .await;
    assert_eq!(response.status(), StatusCode::OK);
    let after = user_share_rows(&pool).await;
    assert_eq!(after[0], (before[0].0, bob.id, 3));
    assert_eq!(after[1], before[1]);
}

// ---------------------------------------------------------------------------
// Test: Delete removes widgets and refresh-rate preferences
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_cascades_widgets_and_preferences(pool: PgPool) {
    let user = create_user(&pool, "alice", "user").await;
    seed_monitoring(&pool, &[&user], 2).await;
    let id = create_dashboard(&pool, &user, cpu_dashboard("Servers")).await;
    let widget_id = fetch_dashboard(&pool, &user, id).await["widgets"][0]["widget_id"]
        .as_i64()
        .unwrap();

    put_json_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/user/widgets/{widget_id}/refresh-rate"),
        &user.token,
        &json!({ "refresh_rate": 30 }),
    )
    .await;
    assert_eq!(count_rows(&pool, "profiles").await, 1);

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/dashboards/delete",
        &user.token,
        &json!({ "dashboard_ids": [id] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["dashboard_ids"], json!([id]));
    assert_eq!(count_rows(&pool, "dashboard").await, 0);
    assert_eq!(count_rows(&pool, "widget").await, 0);
    assert_eq!(count_rows(&pool, "widget_field").await, 0);
    assert_eq!(count_rows(&pool, "profiles").await, 0);
}

// ---------------------------------------------------------------------------
// Test: Deleting someone else's dashboard fails with the uniform message
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_foreign_dashboard_is_forbidden(pool: PgPool) {
    let alice = create_user(&pool, "alice", "user").await;
    let bob = create_user(&pool, "bob", "user").await;
    let id = create_dashboard(&pool, &alice, json!({ "name": "Mine", "private": false })).await;

    for ids in [json!([id]), json!([id + 1000])] {
        let response = post_json_auth(
            build_test_app(pool.clone()),
            "/api/v1/dashboards/delete",
            &bob.token,
            &json!({ "dashboard_ids": ids }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let json = body_json(response).await;
        assert_eq!(json["error"], NO_PERMISSIONS);
    }
    assert_eq!(count_rows(&pool, "dashboard").await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_rejects_repeated_ids(pool: PgPool) {
    let alice = create_user(&pool, "alice", "user").await;
    let id = create_dashboard(&pool, &alice, json!({ "name": "Mine" })).await;

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/dashboards/delete",
        &alice.token,
        &json!({ "dashboard_ids": [id, id] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(count_rows(&pool, "dashboard").await, 1);
}

// ---------------------------------------------------------------------------
// Test: Refresh-rate preferences
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rate_round_trip(pool: PgPool) {
    let user = create_user(&pool, "alice", "user").await;
    let id = create_dashboard(
        &pool,
        &user,
        json!({ "name": "Clock", "widgets": [{ "type": "clock" }] }),
    )
    .await;
    let widget_id = fetch_dashboard(&pool, &user, id).await["widgets"][0]["widget_id"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/v1/user/widgets/{widget_id}/refresh-rate");

    let response = get_auth(build_test_app(pool.clone()), &uri, &user.token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["refresh_rate"], Value::Null);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &user.token,
        &json!({ "refresh_rate": 120 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(build_test_app(pool.clone()), &uri, &user.token).await;
    assert_eq!(body_json(response).await["data"]["refresh_rate"], 120);

    let response = put_json_auth(
        build_test_app(pool.clone()),
        &uri,
        &user.token,
        &json!({ "refresh_rate": 25 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rate_of_hidden_widget_is_not_found(pool: PgPool) {
    let alice = create_user(&pool, "alice", "user").await;
    let bob = create_user(&pool, "bob", "user").await;
    let id = create_dashboard(
        &pool,
        &alice,
        json!({ "name": "Clock", "widgets": [{ "type": "clock" }] }),
    )
    .await;
    let widget_id = fetch_dashboard(&pool, &alice, id).await["widgets"][0]["widget_id"]
        .as_i64()
        .unwrap();

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/user/widgets/{widget_id}/refresh-rate"),
        &bob.token,
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: Audit trail
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn audit_log_is_super_admin_only(pool: PgPool) {
    let user = create_user(&pool, "alice", "user").await;

    let response =
        get_auth(build_test_app(pool.clone()), "/api/v1/admin/audit-logs", &user.token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn dashboard_changes_are_audited_and_chained(pool: PgPool) {
    let admin = create_user(&pool, "root", "super_admin").await;
    let user = create_user(&pool, "alice", "user").await;
    let id = create_dashboard(&pool, &user, json!({ "name": "Audited" })).await;
    put_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/dashboards",
        &user.token,
        &json!({ "dashboard_id": id, "name": "Renamed" }),
    )
    .await;
    post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/dashboards/delete",
        &user.token,
        &json!({ "dashboard_ids": [id] }),
    )
    .await;

    let response = get_auth(
        build_test_app(pool.clone()),
        &format!("/api/v1/admin/audit-logs?resource=dashboard&resource_id={id}"),
        &admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let actions: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["delete", "update", "add"]);

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/v1/admin/audit-logs/integrity-check",
        &admin.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["verified"], 3);
    assert_eq!(json["data"]["first_break"], Value::Null);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn integrity_check_detects_tampering(pool: PgPool) {
    let admin = create_user(&pool, "root", "super_admin").await;
    create_dashboard(&pool, &admin, json!([{ "name": "One" }, { "name": "Two" }])).await;

    let first: i64 = sqlx::query_scalar("SELECT MIN(id) FROM audit_log")
        .fetch_one(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE audit_log SET resource_id = resource_id + 1 WHERE id = $1")
        .bind(first)
        .execute(&pool)
        .await
        .unwrap();

    let response = get_auth(
        build_test_app(pool.clone()),
        "/api/v1/admin/audit-logs/integrity-check",
        &admin.token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["verified"], 0);
    assert_eq!(json["data"]["first_break"], first);
}
