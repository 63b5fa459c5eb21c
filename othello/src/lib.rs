//! Core Othello types shared across the coach.
//!
//! This crate owns the project's canonical board representation and
//! position identity. It deliberately contains no search or evaluation
//! code; engines and self-play workers are separate components that
//! exchange these types with the knowledge store.

pub mod board;
pub mod key;
pub mod notation;

pub use board::{Board, Side};
pub use key::PositionKey;
pub use notation::{Move, NotationError, Square};
