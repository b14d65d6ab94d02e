use super::*;
use serde_json::json;

#[test]
fn user_deserializes_from_login_shape() {
    let user: User = serde_json::from_value(json!({
        "id": "1",
        "username": "alice",
        "email": "a@b.com"
    }))
    .unwrap();
    assert_eq!(user.id, "1");
    assert_eq!(user.username, "alice");
    assert_eq!(user.email, "a@b.com");
}

#[test]
fn login_response_token_is_optional() {
    let resp: LoginResponse = serde_json::from_value(json!({
        "user": { "id": "1", "username": "alice", "email": "a@b.com" }
    }))
    .unwrap();
    assert_eq!(resp.token, None);
}

#[test]
fn create_session_request_uses_camel_case() {
    let body = serde_json::to_value(CreateSessionRequest { user_id: "u1" }).unwrap();
    assert_eq!(body, json!({ "userId": "u1" }));
}

#[test]
fn send_message_request_uses_camel_case() {
    let body = serde_json::to_value(SendMessageRequest { user_id: "u1", message: "hi" }).unwrap();
    assert_eq!(body, json!({ "userId": "u1", "message": "hi" }));
}

#[test]
fn register_request_field_names() {
    let body = serde_json::to_value(RegisterRequest { name: "Al", email: "a@b.com", password: "pw" }).unwrap();
    assert_eq!(body, json!({ "name": "Al", "email": "a@b.com", "password": "pw" }));
}

#[test]
fn user_accepts_numeric_id() {
    let user: User = serde_json::from_value(json!({
        "id": 17,
        "username": "alice",
        "email": "a@b.com"
    }))
    .unwrap();
    assert_eq!(user.id, "17");
}

#[test]
fn user_rejects_non_scalar_id() {
    let result = serde_json::from_value::<User>(json!({ "id": { "v": 1 } }));
    assert!(result.is_err());
}

#[test]
fn user_keeps_extra_fields_through_serialization() {
    let raw = json!({
        "id": "1",
        "username": "alice",
        "email": "a@b.com",
        "role": "admin",
        "createdAt": "2026-01-01T00:00:00Z"
    });
    let user: User = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(user.extra.get("role"), Some(&json!("admin")));
    assert_eq!(serde_json::to_value(&user).unwrap(), raw);
}

#[test]
fn user_missing_name_and_email_default_to_empty() {
    let user: User = serde_json::from_value(json!({ "id": "1" })).unwrap();
    assert_eq!(user, User::new("1", "", ""));
}

#[test]
fn chat_session_id_from_each_key() {
    for key in ["sessionId", "session_id", "id"] {
        let mut body = Map::new();
        body.insert(key.to_owned(), json!("s1"));
        let session: ChatSession = serde_json::from_value(Value::Object(body)).unwrap();
        assert_eq!(session.session_id().as_deref(), Some("s1"), "key {key}");
    }
}

#[test]
fn chat_session_numeric_id() {
    let session: ChatSession = serde_json::from_value(json!({ "sessionId": 42 })).unwrap();
    assert_eq!(session.session_id().as_deref(), Some("42"));
}

#[test]
fn chat_session_both_keys_prefers_session_id() {
    let session: ChatSession = serde_json::from_value(json!({ "id": "row-7", "sessionId": "s1" })).unwrap();
    assert_eq!(session.session_id().as_deref(), Some("s1"));
}

#[test]
fn chat_session_nested_handle() {
    let session: ChatSession = serde_json::from_value(json!({ "session": { "id": "s1" } })).unwrap();
    assert_eq!(session.session_id().as_deref(), Some("s1"));
}

#[test]
fn chat_session_keeps_raw_body() {
    let raw = json!({ "sessionId": "s1", "createdAt": "2026-01-01T00:00:00Z" });
    let session: ChatSession = serde_json::from_value(raw.clone()).unwrap();
    assert_eq!(session.body, raw);
}

#[test]
fn chat_session_without_handle_still_decodes() {
    let session: ChatSession = serde_json::from_value(json!({ "ok": true })).unwrap();
    assert_eq!(session.session_id(), None);
}
