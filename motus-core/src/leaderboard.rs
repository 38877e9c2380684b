use std::cmp::Ordering;
use std::collections::BTreeMap;

use motus_types::{GuessAttempt, LeaderboardEntry, Leaderboards, UserScore};

/// Won-word tally for one user.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct WinTally {
    words: u32,
    tries: u64,
}

impl WinTally {
    fn add(&mut self, attempt: &GuessAttempt) {
        if attempt.is_won() {
            self.words += 1;
            self.tries += u64::from(attempt.tries);
        }
    }

    fn average_tries(&self) -> f64 {
        if self.words == 0 {
            return 0.0;
        }
        round_one_decimal(self.tries as f64 / f64::from(self.words))
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Per-user totals over won attempts only. A user without wins gets an
/// average of 0.0.
pub fn summarize_user(user_id: &str, attempts: &[GuessAttempt]) -> UserScore {
    let mut tally = WinTally::default();
    for attempt in attempts.iter().filter(|a| a.user_id == user_id) {
        tally.add(attempt);
    }

    UserScore {
        user_id: user_id.to_string(),
        total_guessed_words: tally.words,
        average_tries: tally.average_tries(),
    }
}

/// Build both rankings. Users with no won attempt appear in neither.
///
/// Ties are broken deterministically: by total wins the order is
/// (wins desc, average asc, user_id asc); by average it is
/// (average asc, wins desc, user_id asc).
pub fn compute_leaderboards(attempts: &[GuessAttempt]) -> Leaderboards {
    let mut per_user: BTreeMap<&str, (WinTally, &str)> = BTreeMap::new();
    for attempt in attempts {
        let (tally, nickname) = per_user
            .entry(attempt.user_id.as_str())
            .or_insert((WinTally::default(), attempt.nickname.as_str()));
        if nickname.is_empty() {
            *nickname = attempt.nickname.as_str();
        }
        tally.add(attempt);
    }

    let entries: Vec<LeaderboardEntry> = per_user
        .into_iter()
        .filter(|(_, (tally, _))| tally.words > 0)
        .map(|(user_id, (tally, nickname))| LeaderboardEntry {
            user_id: user_id.to_string(),
            nickname: nickname.to_string(),
            total_guessed_words: tally.words,
            average_tries: tally.average_tries(),
        })
        .collect();

    let mut by_total = entries.clone();
    by_total.sort_by(rank_by_total);

    let mut by_average = entries;
    by_average.sort_by(rank_by_average);

    Leaderboards {
        leaderboard_by_total: by_total,
        leaderboard_by_average: by_average,
    }
}

fn rank_by_total(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.total_guessed_words
        .cmp(&a.total_guessed_words)
        .then_with(|| a.average_tries.total_cmp(&b.average_tries))
        .then_with(|| a.user_id.cmp(&b.user_id))
}

fn rank_by_average(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    a.average_tries
        .total_cmp(&b.average_tries)
        .then_with(|| b.total_guessed_words.cmp(&a.total_guessed_words))
        .then_with(|| a.user_id.cmp(&b.user_id))
}
