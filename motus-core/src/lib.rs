pub mod leaderboard;
pub mod scoring;
pub mod seed;
pub mod word_list;

// Re-export main components
pub use leaderboard::*;
pub use scoring::*;
pub use seed::*;
pub use word_list::*;
