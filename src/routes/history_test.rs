use super::*;
use crate::db::{Role, Store};
use crate::state::test_helpers;

async fn body_bytes(resp: Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read")
        .to_vec()
}

async fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(resp).await).expect("body should be JSON")
}

fn user_query(user_id: Option<String>) -> Query<UserQuery> {
    Query(UserQuery { user_id })
}

#[test]
fn history_errors_map_to_statuses() {
    assert_eq!(history_error_to_status(&HistoryError::MissingUserId), StatusCode::BAD_REQUEST);
    assert_eq!(history_error_to_status(&HistoryError::ImageNotFound(Uuid::nil())), StatusCode::NOT_FOUND);
    assert_eq!(history_error_to_status(&HistoryError::MalformedDataUrl), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn create_conversation_returns_created_row() {
    let (state, store) = test_helpers::test_app_state();
    let user_id = Uuid::new_v4();
    let body = CreateConversationBody { user_id: Some(user_id.to_string()), title: None };

    let resp = create_conversation(State(state), Ok(Json(body))).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    assert_eq!(json["title"], "New Conversation");
    assert_eq!(json["user_id"], user_id.to_string());
    assert_eq!(store.conversation_count(), 1);
}

#[tokio::test]
async fn create_conversation_requires_user() {
    let (state, store) = test_helpers::test_app_state();
    let body = CreateConversationBody { user_id: None, title: Some("x".into()) };

    let resp = create_conversation(State(state), Ok(Json(body))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.conversation_count(), 0);
}

#[tokio::test]
async fn list_conversations_requires_valid_user() {
    let (state, _store) = test_helpers::test_app_state();
    let resp = list_conversations(State(state.clone()), user_query(None)).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = list_conversations(State(state), user_query(Some("not-a-uuid".into()))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_conversations_returns_users_rows() {
    let (state, store) = test_helpers::test_app_state();
    let user_id = Uuid::new_v4();
    store.create_conversation(user_id, "mine").await.unwrap();
    store.create_conversation(Uuid::new_v4(), "theirs").await.unwrap();

    let resp = list_conversations(State(state), user_query(Some(user_id.to_string()))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let titles: Vec<_> = json.as_array().unwrap().iter().map(|c| c["title"].clone()).collect();
    assert_eq!(titles, [serde_json::json!("mine")]);
}

#[tokio::test]
async fn get_conversation_includes_ordered_messages() {
    let (state, store) = test_helpers::test_app_state();
    let conv = store.create_conversation(Uuid::new_v4(), "thread").await.unwrap();
    store.insert_message(conv.id, Role::User, "hello").await.unwrap();
    store.insert_message(conv.id, Role::Assistant, "hi there").await.unwrap();

    let resp = get_conversation(State(state), Path(conv.id.to_string())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["title"], "thread");
    assert_eq!(json["messages"][0]["role"], "user");
    assert_eq!(json["messages"][1]["content"], "hi there");
}

#[tokio::test]
async fn get_conversation_bad_or_unknown_id() {
    let (state, _store) = test_helpers::test_app_state();
    let resp = get_conversation(State(state.clone()), Path("nope".into())).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = get_conversation(State(state), Path(Uuid::new_v4().to_string())).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_images_returns_gallery() {
    let (state, store) = test_helpers::test_app_state();
    let user_id = Uuid::new_v4();
    store.seed_image(user_id, "data:image/png;base64,AA==", Some("generated-1.png"));

    let resp = list_images(State(state), user_query(Some(user_id.to_string()))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json[0]["file_name"], "generated-1.png");
    assert_eq!(json[0]["image_url"], "data:image/png;base64,AA==");
}

#[tokio::test]
async fn download_inline_sets_attachment_headers() {
    let (state, store) = test_helpers::test_app_state();
    let image = store.seed_image(Uuid::new_v4(), "data:image/png;base64,iVBORw0KGgo=", Some("generated-42.png"));

    let resp = download_image(State(state), Path(image.id.to_string())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(
        resp.headers().get(CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"generated-42.png\""
    );
    assert_eq!(body_bytes(resp).await, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
}

#[tokio::test]
async fn download_remote_redirects() {
    let (state, store) = test_helpers::test_app_state();
    let image = store.seed_image(Uuid::new_v4(), "https://img.test/cat.png", None);

    let resp = download_image(State(state), Path(image.id.to_string())).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers().get("location").unwrap(), "https://img.test/cat.png");
}

#[tokio::test]
async fn download_malformed_data_url_is_unprocessable() {
    let (state, store) = test_helpers::test_app_state();
    let image = store.seed_image(Uuid::new_v4(), "data:image/png;base64,!!", None);

    let resp = download_image(State(state), Path(image.id.to_string())).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn download_mime_that_is_not_a_header_value_is_json_422() {
    let (state, store) = test_helpers::test_app_state();
    let image = store.seed_image(Uuid::new_v4(), "data:image/png\u{7f};base64,AA==", None);

    let resp = download_image(State(state), Path(image.id.to_string())).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(resp).await["error"], "malformed image data URL");
}

#[tokio::test]
async fn download_remote_url_with_newline_is_json_422() {
    let (state, store) = test_helpers::test_app_state();
    let image = store.seed_image(Uuid::new_v4(), "https://img.test/cat\n.png", None);

    let resp = download_image(State(state), Path(image.id.to_string())).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(resp).await["error"].is_string());
}
