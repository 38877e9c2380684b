
use std::net::SocketAddr;
use std::sync::Arc;

use motus_server::clients::{ScoreLedger, UserDirectory};
use motus_server::front;
use motus_server::gateway::{self, Gateway};
use motus_server::identity::IDENTITY_HEADER;
use test_helpers::*;

const UNREACHABLE_FRONT: &str = "http://127.0.0.1:9";

fn client(last_octet: u8) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, last_octet], 40000))
}

/// Serve front on an ephemeral port and return a gateway proxying to it.
fn gateway_with_front(setup: &TestServices) -> Arc<Gateway> {
    let routes = front::create_routes(setup.front(), setup.codec.clone());
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    setup.gateway(&format!("http://{}", addr))
}

#[tokio::test]
async fn test_api_requires_authentication() {
    let setup = TestServices::new().await;
    let routes = gateway::create_routes(setup.gateway(UNREACHABLE_FRONT));

    for path in ["/api/seed", "/api/word", "/api/score"] {
        let response = warp::test::request()
            .method("GET")
            .path(path)
            .reply(&routes)
            .await;
        assert_eq!(response.status(), 401, "{}", path);
        assert_eq!(message_of(response.body()), "Authentication required");
    }

    // A malformed dev token is no better than none
    let response = warp::test::request()
        .method("GET")
        .path("/api/word")
        .header("authorization", bearer("no-colon"))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_first_request_provisions_profile() {
    let setup = TestServices::new().await;
    let routes = gateway::create_routes(setup.gateway(UNREACHABLE_FRONT));

    assert!(setup.directory().get_nickname("alice").await.is_err());

    let response = warp::test::request()
        .method("GET")
        .path("/api/seed")
        .header("authorization", bearer("alice:Alice"))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    let seed = body["seed"].as_u64().unwrap();

    let directory = setup.directory();
    assert_eq!(directory.get_nickname("alice").await.unwrap(), "Alice");
    assert_eq!(directory.get_seed("alice").await.unwrap(), seed);

    // The session cookie works as well, and does not re-provision
    let response = warp::test::request()
        .method("GET")
        .path("/api/seed")
        .header("cookie", "appSession=alice:Renamed")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(directory.get_nickname("alice").await.unwrap(), "Alice");
}

#[tokio::test]
async fn test_only_admins_act_on_other_users() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "chat").await;
    setup.create_player("bob", "chien").await;
    setup.create_player("boss", "maison").await;
    let routes = gateway::create_routes(setup.gateway(UNREACHABLE_FRONT));

    let word_of = |token: &'static str, path: &'static str| {
        let routes = routes.clone();
        async move {
            let response = warp::test::request()
                .method("GET")
                .path(path)
                .header("authorization", bearer(token))
                .reply(&routes)
                .await;
            assert_eq!(response.status(), 200);
            let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
            body["word"].as_str().unwrap().to_string()
        }
    };

    assert_eq!(word_of("alice:alice", "/api/word/bob").await, "chat");
    assert_eq!(word_of("boss:boss:admin", "/api/word/bob").await, "chien");
    assert_eq!(word_of("boss:boss:admin", "/api/word/,").await, "maison");
    assert_eq!(word_of("boss:boss:admin", "/api/word").await, "maison");

    // Overrides naming ids with reserved characters arrive encoded
    setup.create_player("auth0|bob smith", "lilas").await;
    assert_eq!(
        word_of("boss:boss:admin", "/api/word/auth0%7Cbob%20smith").await,
        "lilas"
    );

    // Admins reseed someone else through the body
    let response = warp::test::request()
        .method("POST")
        .path("/api/seed")
        .header("authorization", bearer("boss:boss:admin"))
        .json(&serde_json::json!({ "user_id": "bob", "seed": "partie" }))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    assert_ne!(setup.directory().get_seed("bob").await.unwrap(), seed_for("chien"));
    assert_eq!(
        setup.directory().get_seed("boss").await.unwrap(),
        seed_for("maison")
    );
}

#[tokio::test]
async fn test_guess_through_gateway() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "arbre").await;
    let routes = gateway::create_routes(setup.gateway(UNREACHABLE_FRONT));

    let response = warp::test::request()
        .method("POST")
        .path("/api/guess")
        .header("authorization", bearer("alice:alice"))
        .remote_addr(client(1))
        .json(&serde_json::json!({ "guess": "arbre" }))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["won"], true);

    let score = setup.scores.user_score("alice").await.unwrap();
    assert_eq!(score.total_guessed_words, 1);

    let response = warp::test::request()
        .method("POST")
        .path("/api/guess")
        .header("authorization", bearer("alice:alice"))
        .remote_addr(client(1))
        .body("{not json")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 400);

    let response = warp::test::request()
        .method("POST")
        .path("/api/guess")
        .remote_addr(client(1))
        .json(&serde_json::json!({ "guess": "arbre" }))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_guesses_are_rate_limited_per_ip() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "chat").await;
    let routes = gateway::create_routes(setup.gateway(UNREACHABLE_FRONT));

    let guess_from = |addr: SocketAddr| {
        let routes = routes.clone();
        async move {
            warp::test::request()
                .method("POST")
                .path("/api/guess")
                .header("authorization", bearer("alice:alice"))
                .remote_addr(addr)
                .json(&serde_json::json!({ "guess": "chou" }))
                .reply(&routes)
                .await
        }
    };

    // Invalid guesses still count against the window
    for _ in 0..10 {
        assert_eq!(guess_from(client(1)).await.status(), 400);
    }

    let response = guess_from(client(1)).await;
    assert_eq!(response.status(), 429);
    assert_eq!(
        message_of(response.body()),
        "Too many requests from this IP, please try again later"
    );

    assert_eq!(guess_from(client(2)).await.status(), 400);
}

#[tokio::test]
async fn test_reset_score_with_empty_body_resets_caller() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "chat").await;
    setup.create_player("bob", "chat").await;
    let routes = gateway::create_routes(setup.gateway(UNREACHABLE_FRONT));

    for token in ["alice:alice", "bob:bob"] {
        let response = warp::test::request()
            .method("POST")
            .path("/api/guess")
            .header("authorization", bearer(token))
            .remote_addr(client(3))
            .json(&serde_json::json!({ "guess": "chat" }))
            .reply(&routes)
            .await;
        assert_eq!(response.status(), 200);
    }

    // Plain players cannot reset someone else; the override is ignored
    let response = warp::test::request()
        .method("POST")
        .path("/api/reset-score")
        .header("authorization", bearer("alice:alice"))
        .json(&serde_json::json!({ "user_id": "bob" }))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(message_of(response.body()), "Score reset successfully");

    assert_eq!(
        setup.scores.user_score("alice").await.unwrap().total_guessed_words,
        0
    );
    assert_eq!(
        setup.scores.user_score("bob").await.unwrap().total_guessed_words,
        1
    );

    let response = warp::test::request()
        .method("POST")
        .path("/api/reset-score")
        .header("authorization", bearer("bob:bob"))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        setup.scores.user_score("bob").await.unwrap().total_guessed_words,
        0
    );
}

#[tokio::test]
async fn test_leaderboard_metrics_reset_on_scrape() {
    let setup = TestServices::new().await;
    let routes = gateway::create_routes(setup.gateway(UNREACHABLE_FRONT));

    for _ in 0..3 {
        let response = warp::test::request()
            .method("GET")
            .path("/api/leaderboard")
            .reply(&routes)
            .await;
        assert_eq!(response.status(), 200);
    }

    let response = warp::test::request()
        .method("GET")
        .path("/api/metrics")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.body().as_ref(),
        b"http_requests_leaderbord_total 3\nerror_total 0"
    );

    let response = warp::test::request()
        .method("GET")
        .path("/api/metrics")
        .reply(&routes)
        .await;
    assert_eq!(
        response.body().as_ref(),
        b"http_requests_leaderbord_total 0\nerror_total 0"
    );
}

#[tokio::test]
async fn test_pages_are_proxied_with_signed_identity() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "maison").await;
    let routes = gateway::create_routes(gateway_with_front(&setup));

    let response = warp::test::request()
        .method("GET")
        .path("/")
        .header("authorization", bearer("alice:alice"))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    let html = String::from_utf8_lossy(response.body());
    assert!(html.contains("<strong>6</strong> letters"));
    assert!(html.contains(&format!("<code>{}</code>", seed_for("maison"))));

    // Anonymous visitors get the landing page, even with a forged header
    let response = warp::test::request()
        .method("GET")
        .path("/")
        .header(IDENTITY_HEADER, "forged")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    assert!(String::from_utf8_lossy(response.body()).contains("Sign in to start playing"));
}

#[tokio::test]
async fn test_score_page_requires_login() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "chat").await;
    let routes = gateway::create_routes(gateway_with_front(&setup));

    let response = warp::test::request()
        .method("GET")
        .path("/score")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 401);

    let response = warp::test::request()
        .method("GET")
        .path("/score")
        .header("authorization", bearer("alice:alice"))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    assert!(String::from_utf8_lossy(response.body()).contains("Your score"));
}

#[tokio::test]
async fn test_front_prefix_is_stripped() {
    let setup = TestServices::new().await;
    let routes = gateway::create_routes(gateway_with_front(&setup));

    let response = warp::test::request()
        .method("GET")
        .path("/front/leaderboard")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    assert!(String::from_utf8_lossy(response.body()).contains("Leaderboard"));

    let response = warp::test::request()
        .method("GET")
        .path("/frontier")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_unreachable_front_is_bad_gateway() {
    let setup = TestServices::new().await;
    let routes = gateway::create_routes(setup.gateway(UNREACHABLE_FRONT));

    let response = warp::test::request()
        .method("GET")
        .path("/leaderboard")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 502);
}
