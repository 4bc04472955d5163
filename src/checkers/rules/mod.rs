//! Move legality rules for checkers.
//!
//! This module contains pure functions over a [`Board`](super::Board).
//! They never perform I/O and never mutate the board they are given; the
//! server remains authoritative and these checks only pre-validate moves
//! before they are submitted.

pub mod capture;
pub mod classify;
pub mod movers;
pub mod promotion;

pub use capture::{capture_hops, is_capture_available, must_continue_capture};
pub use classify::{MoveKind, classify};
pub use movers::movable_pieces;
pub use promotion::promotes;
