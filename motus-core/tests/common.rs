use motus_core::WordList;
use motus_types::GuessAttempt;

/// Creates a word list with a known set of French words
pub fn create_test_words() -> WordList {
    let word_list = "chat\nchien\nmaison\narbre\nlilas\nbarre\n# rare\nzythum";
    WordList::from_text(word_list).expect("test word list is not empty")
}

/// Creates a ledger record for one (user, word) pair on a fixed day
pub fn create_attempt(user_id: &str, word: &str, tries: u32, won: bool) -> GuessAttempt {
    GuessAttempt {
        user_id: user_id.to_string(),
        nickname: user_id.to_uppercase(),
        date: "2026-10-19".to_string(),
        word: word.to_string(),
        tries,
        score: u8::from(won),
    }
}
