//! Integration tests for optimistic like/comment mutations.

use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use recipe_feed_client::api::models::Post;
use recipe_feed_client::api::ApiClient;
use recipe_feed_client::config::Config;
use recipe_feed_client::error::ApiError;
use recipe_feed_client::posts::MutationCoordinator;
use recipe_feed_client::session::IdentityKey;

fn setup(server_uri: &str) -> MutationCoordinator {
    let config = Config {
        api_url: server_uri.to_string(),
        ..Config::for_testing()
    };
    let api = ApiClient::new(&config).expect("Failed to create API client");
    MutationCoordinator::new(api)
}

fn post(liked: bool, likes: i64) -> Post {
    Post {
        id: 1,
        liked_by_user: liked,
        likes_count: likes,
        ..Post::default()
    }
}

#[tokio::test]
async fn test_like_applies_optimistically_and_sticks_on_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/like/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "liked": true,
            "likes_count": 5,
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coordinator = setup(&mock_server.uri());
    let mut p = post(false, 4);

    coordinator.toggle_like("token", &mut p).await.unwrap();
    assert!(p.liked_by_user);
    assert_eq!(p.likes_count, 5);
}

#[tokio::test]
async fn test_like_rollback_on_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/like/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let coordinator = setup(&mock_server.uri());

    // Rollback law holds for any starting state.
    for (liked, likes) in [(false, 0), (false, 9), (true, 1), (true, 0)] {
        let mut p = post(liked, likes);
        let err = coordinator.toggle_like("token", &mut p).await.unwrap_err();
        assert!(matches!(err, ApiError::Api { status: 500, .. }));
        assert_eq!((p.liked_by_user, p.likes_count), (liked, likes));
    }
}

#[tokio::test]
async fn test_comment_reconciles_server_id() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/comment/"))
        .and(body_json(serde_json::json!({ "text": "lovely" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": 777 })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coordinator = setup(&mock_server.uri());
    let identity = IdentityKey::new("alice");
    let mut p = post(false, 0);

    coordinator
        .submit_comment("token", &mut p, "lovely", identity.as_ref())
        .await
        .unwrap();

    assert_eq!(p.comments.len(), 1);
    assert_eq!(p.comments_count, 1);
    assert_eq!(p.comments[0].id, 777);
    assert_eq!(p.comments[0].username, "alice");
}

#[tokio::test]
async fn test_comment_keeps_provisional_id_without_server_id() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/comment/"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!({ "message": "comment added" })),
        )
        .mount(&mock_server)
        .await;

    let coordinator = setup(&mock_server.uri());
    let mut p = post(false, 0);

    coordinator
        .submit_comment("token", &mut p, "hi", None)
        .await
        .unwrap();

    assert_eq!(p.comments.len(), 1);
    assert!(p.comments[0].id > 0);
}

#[tokio::test]
async fn test_comment_rollback_on_failure() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/comment/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let coordinator = setup(&mock_server.uri());
    let mut p = post(false, 0);

    let err = coordinator
        .submit_comment("token", &mut p, "doomed", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Api { status: 500, .. }));
    assert!(p.comments.is_empty());
    assert_eq!(p.comments_count, 0);
}

#[tokio::test]
async fn test_empty_comment_is_validation_error_without_network() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&mock_server)
        .await;

    let coordinator = setup(&mock_server.uri());
    let mut p = post(false, 0);

    let err = coordinator
        .submit_comment("token", &mut p, "   ", None)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert!(p.comments.is_empty());
}

#[tokio::test]
async fn test_failed_comment_does_not_touch_other_provisional() {
    // One post, two submissions: the second fails, the first must survive.
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/comment/"))
        .and(body_json(serde_json::json!({ "text": "keeper" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": 10 })))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/posts/1/comment/"))
        .and(body_json(serde_json::json!({ "text": "loser" })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let coordinator = setup(&mock_server.uri());
    let mut p = post(false, 0);

    coordinator
        .submit_comment("token", &mut p, "keeper", None)
        .await
        .unwrap();
    let _ = coordinator
        .submit_comment("token", &mut p, "loser", None)
        .await
        .unwrap_err();

    assert_eq!(p.comments.len(), 1);
    assert_eq!(p.comments[0].text, "keeper");
    assert_eq!(p.comments_count, 1);
}
