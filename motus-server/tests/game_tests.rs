
use motus_persistence::repositories::ScoreStore;
use motus_server::clients::{GameApi, ScoreLedger};
use motus_server::error::ApiError;
use motus_server::game::{self, LOSE_MESSAGE, WIN_MESSAGE};
use motus_types::{GuessRequest, LetterStatus, SeedInput, SetSeedRequest};
use test_helpers::*;

fn guess(user_id: &str, word: &str) -> GuessRequest {
    GuessRequest {
        user_id: Some(user_id.to_string()),
        guess: word.to_string(),
    }
}

#[tokio::test]
async fn test_word_follows_stored_seed() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "maison").await;

    let word = setup.game.get_word("alice").await.unwrap();
    assert_eq!(word.word, "maison");

    let seed = setup.game.get_seed("alice").await.unwrap();
    assert_eq!(seed.seed, seed_for("maison"));
}

#[tokio::test]
async fn test_losing_guess_is_scored_and_recorded() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "arbre").await;

    let response = setup.game.guess(&guess("alice", "barre")).await.unwrap();

    assert!(!response.won);
    assert_eq!(response.message, LOSE_MESSAGE);
    let statuses: Vec<LetterStatus> = response.result.iter().map(|l| l.status).collect();
    assert_eq!(
        statuses,
        vec![
            LetterStatus::Misplaced,
            LetterStatus::Misplaced,
            LetterStatus::Misplaced,
            LetterStatus::Correct,
            LetterStatus::Correct,
        ]
    );

    // A miss keeps the same target and counts as a try, not a win
    assert_eq!(setup.game.get_word("alice").await.unwrap().word, "arbre");
    let score = setup.scores.user_score("alice").await.unwrap();
    assert_eq!(score.total_guessed_words, 0);
}

#[tokio::test]
async fn test_winning_guess_reseeds_player() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "chien").await;
    let before = setup.game.get_seed("alice").await.unwrap().seed;

    setup.game.guess(&guess("alice", "chat")).await.unwrap();
    let response = setup.game.guess(&guess("alice", "chien")).await.unwrap();

    assert!(response.won);
    assert_eq!(response.message, WIN_MESSAGE);
    assert!(
        response
            .result
            .iter()
            .all(|letter| letter.status == LetterStatus::Correct)
    );

    let after = setup.game.get_seed("alice").await.unwrap().seed;
    assert_ne!(before, after);

    let score = setup.scores.user_score("alice").await.unwrap();
    assert_eq!(score.total_guessed_words, 1);
    assert_eq!(score.average_tries, 2.0);
}

#[tokio::test]
async fn test_same_word_cannot_be_won_twice_a_day() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "lilas").await;

    assert!(setup.game.guess(&guess("alice", "lilas")).await.unwrap().won);

    // Pin the same target again; the ledger already holds today's win
    setup.set_target("alice", "lilas").await;
    let result = setup.game.guess(&guess("alice", "lilas")).await;

    assert_eq!(result.unwrap_err(), ApiError::AlreadySolvedToday);
    assert_eq!(
        ApiError::AlreadySolvedToday.to_string(),
        "This word was already guessed today!"
    );
}

#[tokio::test]
async fn test_invalid_guesses_are_rejected() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "chat").await;

    let unknown = setup.game.guess(&guess("alice", "chou")).await.unwrap_err();
    assert_eq!(unknown.status(), 400);
    assert_eq!(unknown.to_string(), "Invalid guess: word isn't in the list");

    let too_long = setup.game.guess(&guess("alice", "maisons")).await.unwrap_err();
    assert_eq!(too_long.status(), 400);
    assert_eq!(too_long.to_string(), "Invalid guess length");

    // Rejected guesses never reach the ledger
    assert!(setup.store.all_attempts().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_guess_requires_user() {
    let setup = TestServices::new().await;

    let result = setup
        .game
        .guess(&GuessRequest {
            user_id: None,
            guess: "chat".to_string(),
        })
        .await;
    assert_eq!(
        result.unwrap_err(),
        ApiError::InvalidInput("Missing user_id".to_string())
    );
}

#[tokio::test]
async fn test_unknown_user_is_not_found() {
    let setup = TestServices::new().await;

    let err = setup.game.get_word("ghost").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "User not found");
}

#[tokio::test]
async fn test_shared_seed_text_gives_same_word() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "chat").await;
    setup.create_player("bob", "chien").await;

    for user_id in ["alice", "bob"] {
        setup
            .game
            .set_seed(&SetSeedRequest {
                user_id: Some(user_id.to_string()),
                seed: Some(SeedInput::Text("partie-du-jour".to_string())),
            })
            .await
            .unwrap();
    }

    let alice = setup.game.get_word("alice").await.unwrap();
    let bob = setup.game.get_word("bob").await.unwrap();
    assert_eq!(alice, bob);
}

#[tokio::test]
async fn test_routes() {
    let setup = TestServices::new().await;
    setup.create_player("alice", "chat").await;
    let routes = game::create_routes(setup.game.clone());

    let response = warp::test::request()
        .method("GET")
        .path("/word/alice")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.body().as_ref(), br#"{"word":"chat"}"#);

    let response = warp::test::request()
        .method("POST")
        .path("/guess")
        .json(&guess("alice", "chien"))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body["won"], false);
    assert_eq!(body["result"][0]["status"], "correct");

    let response = warp::test::request()
        .method("POST")
        .path("/guess")
        .json(&guess("alice", "xyz"))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 400);

    let response = warp::test::request()
        .method("POST")
        .path("/seed")
        .json(&serde_json::json!({ "user_id": "alice", "seed": 42 }))
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(message_of(response.body()), "Seed set successfully");

    let response = warp::test::request()
        .method("GET")
        .path("/generateSeed")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);

    let response = warp::test::request()
        .method("GET")
        .path("/seed/ghost")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 404);
    assert_eq!(message_of(response.body()), "User not found");

    let response = warp::test::request()
        .method("GET")
        .path("/health")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.body().as_ref(), b"OK");
}

#[tokio::test]
async fn test_percent_encoded_user_id_in_path() {
    let setup = TestServices::new().await;
    setup.create_player("auth0|a b", "lilas").await;
    let routes = game::create_routes(setup.game.clone());

    let response = warp::test::request()
        .method("GET")
        .path("/word/auth0%7Ca%20b")
        .reply(&routes)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.body().as_ref(), br#"{"word":"lilas"}"#);
}
