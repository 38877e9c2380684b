//! HTML templates. Every interpolated value goes through [`escape`].

use motus_types::{Identity, LeaderboardEntry, Leaderboards, UserScore};

pub fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

const STYLE: &str = r#"
body { font-family: sans-serif; max-width: 48rem; margin: 0 auto; padding: 1rem; }
nav a { margin-right: 1rem; }
.letter { display: inline-block; width: 1.6rem; text-align: center; margin: 1px; color: #fff; }
.correct { background: #198754; }
.misplaced { background: #ffc107; color: #000; }
.wrong { background: #6c757d; }
table { border-collapse: collapse; }
td, th { padding: 0.25rem 0.75rem; }
"#;

// Shared by every page that posts JSON back through the gateway.
const POST_JSON_JS: &str = r#"
async function postJson(url, body) {
  const response = await fetch(url, {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify(body),
  });
  const payload = await response.json();
  if (!response.ok) {
    throw new Error(payload.message || "Request failed");
  }
  return payload;
}
"#;

const BOARD_JS: &str = r#"
let attempt = 1;
document.getElementById("wordForm").addEventListener("submit", async (event) => {
  event.preventDefault();
  const guess = document.getElementById("guess").value;
  try {
    const response = await postJson("/api/guess", { guess });
    const letters = response.result
      .map(({ letter, status }) => `<span class="letter ${status}">${letter}</span>`)
      .join("");
    const row = document.createElement("tr");
    row.innerHTML = `<th>${attempt}</th><td>${letters}</td>`;
    document.getElementById("attempts").prepend(row);
    attempt++;
    if (response.won) {
      alert(response.message);
      window.location.href = "/";
    }
  } catch (error) {
    alert(error.message);
  }
});
document.getElementById("seedForm").addEventListener("submit", async (event) => {
  event.preventDefault();
  const seed = document.getElementById("newSeed").value;
  try {
    const response = await postJson("/api/seed", { seed });
    alert(response.message);
    window.location.href = "/";
  } catch (error) {
    alert(error.message);
  }
});
"#;

const SCORE_JS: &str = r#"
document.getElementById("resetScore").addEventListener("click", async () => {
  if (!confirm("Reset your score? This cannot be undone.")) {
    return;
  }
  try {
    const response = await postJson("/api/reset-score", {});
    alert(response.message);
    window.location.href = "/score";
  } catch (error) {
    alert(error.message);
  }
});
"#;

fn layout(title: &str, identity: Option<&Identity>, body: &str, script: &str) -> String {
    let account = match identity {
        Some(identity) => format!(
            "<span>Signed in as <strong>{}</strong></span>",
            escape(&identity.nickname)
        ),
        None => "<span>Not signed in</span>".to_string(),
    };

    let scripts = if script.is_empty() {
        String::new()
    } else {
        format!("<script>{}{}</script>", POST_JSON_JS, script)
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<title>Motus - {title}</title>
<style>{STYLE}</style>
</head>
<body>
<nav><a href="/">Motus</a><a href="/score">Score</a><a href="/leaderboard">Leaderboard</a>{account}</nav>
<main>
{body}
</main>
{scripts}
</body>
</html>"#,
        title = escape(title),
    )
}

pub fn landing() -> String {
    layout(
        "Welcome",
        None,
        r#"<h1>Motus</h1>
<p>Find the hidden word. Each guess tells you which letters are in the right place and which ones are misplaced.</p>
<p>Sign in to start playing.</p>"#,
        "",
    )
}

pub fn board(identity: &Identity, seed: u64, word_length: usize) -> String {
    let body = format!(
        r#"<h1>Find the word</h1>
<p>The word has <strong>{word_length}</strong> letters. Current seed: <code>{seed}</code></p>
<form id="wordForm">
  <input id="guess" name="guess" maxlength="{word_length}" autocomplete="off" autofocus>
  <button type="submit">Guess</button>
</form>
<table><tbody id="attempts"></tbody></table>
<h2>Change seed</h2>
<form id="seedForm">
  <input id="newSeed" name="seed" placeholder="Any text">
  <button type="submit">Set seed</button>
</form>"#
    );
    layout("Play", Some(identity), &body, BOARD_JS)
}

pub fn score(identity: &Identity, score: &UserScore) -> String {
    let body = format!(
        r#"<h1>Your score</h1>
<p>Words found: <strong>{}</strong></p>
<p>Average tries: <strong>{:.1}</strong></p>
<button id="resetScore" type="button">Reset score</button>"#,
        score.total_guessed_words, score.average_tries
    );
    layout("Score", Some(identity), &body, SCORE_JS)
}

fn ranking_table(caption: &str, entries: &[LeaderboardEntry]) -> String {
    let rows = if entries.is_empty() {
        r#"<tr><td colspan="4">No scores yet</td></tr>"#.to_string()
    } else {
        entries
            .iter()
            .enumerate()
            .map(|(rank, entry)| {
                format!(
                    "<tr><th>{}</th><td>{}</td><td>{}</td><td>{:.1}</td></tr>",
                    rank + 1,
                    escape(&entry.nickname),
                    entry.total_guessed_words,
                    entry.average_tries
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"<h2>{}</h2>
<table>
<thead><tr><th>#</th><th>Player</th><th>Words</th><th>Average tries</th></tr></thead>
<tbody>
{}
</tbody>
</table>"#,
        escape(caption),
        rows
    )
}

pub fn leaderboard(identity: Option<&Identity>, boards: &Leaderboards) -> String {
    let body = format!(
        "<h1>Leaderboard</h1>\n{}\n{}",
        ranking_table("Most words found", &boards.leaderboard_by_total),
        ranking_table("Fewest tries", &boards.leaderboard_by_average)
    );
    layout("Leaderboard", identity, &body, "")
}

pub fn not_found(identity: Option<&Identity>) -> String {
    layout(
        "Not found",
        identity,
        r#"<h1>Page not found</h1>
<p><a href="/">Back to the game</a></p>"#,
        "",
    )
}
