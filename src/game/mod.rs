pub mod models;
pub mod seat;

pub use models::{Game, GameSettings, Player, Round, RoundData, RoundWinner, ScoreInfo};
pub use seat::seat_index;
