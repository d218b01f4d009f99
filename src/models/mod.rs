pub mod action;
pub mod hand;
pub mod player;

pub use action::{ActionRecord, AttributionUpdate, MoveId, ReviewDecision};
pub use hand::{HandObservation, Vec2};
pub use player::{Attribution, Player};
