mod common;

use common::*;
use motus_core::{GuessError, ScoringEngine, compute_leaderboards, generate_seed, summarize_user};
use motus_types::LetterStatus;

#[test]
fn test_word_selection_follows_seed_modulo() {
    let words = create_test_words();
    for seed in [0u64, 1, 5, 6, 7, 12345, u64::MAX] {
        let expected = &words.words()[(seed % words.len() as u64) as usize];
        assert_eq!(words.select(seed), expected);
    }
}

#[test]
fn test_shared_code_selects_same_word() {
    let words = create_test_words();
    let first = words.select(generate_seed(Some("partie-du-jour")));
    let second = words.select(generate_seed(Some("partie-du-jour")));
    assert_eq!(first, second);
}

#[test]
fn test_every_listed_word_wins_against_itself() {
    let words = create_test_words();
    for word in words.words() {
        let evaluation = ScoringEngine::evaluate_guess(word, word, &words).unwrap();
        assert!(evaluation.won);
        assert!(
            evaluation
                .result
                .iter()
                .all(|letter| letter.status == LetterStatus::Correct)
        );
    }
}

#[test]
fn test_max_length_comes_from_longest_word() {
    let words = create_test_words();
    assert_eq!(words.max_word_length(), 6);
    assert_eq!(
        ScoringEngine::evaluate_guess("maisons", "chat", &words),
        Err(GuessError::InvalidLength)
    );
}

#[test]
fn test_score_and_leaderboard_agree() {
    let attempts = vec![
        create_attempt("alice", "chat", 2, true),
        create_attempt("alice", "chien", 5, false),
        create_attempt("bob", "chat", 1, true),
        create_attempt("bob", "arbre", 3, true),
        create_attempt("carol", "chat", 6, false),
    ];

    let boards = compute_leaderboards(&attempts);
    assert_eq!(boards.leaderboard_by_total.len(), 2);
    assert_eq!(boards.leaderboard_by_total[0].user_id, "bob");
    assert_eq!(boards.leaderboard_by_total[0].nickname, "BOB");
    assert_eq!(boards.leaderboard_by_average[0].user_id, "bob");
    assert!(
        boards
            .leaderboard_by_total
            .iter()
            .all(|entry| entry.user_id != "carol")
    );

    let bob = summarize_user("bob", &attempts);
    assert_eq!(bob.total_guessed_words, boards.leaderboard_by_total[0].total_guessed_words);
    assert_eq!(bob.average_tries, 2.0);
}
