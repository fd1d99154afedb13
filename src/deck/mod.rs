//! Text deck output and read-back.
//!
//! A deck holds one card per cell, `<cell> <material> <density> <region>
//! [tmp=<t>]` with material `0` meaning void, then a blank line, then one
//! card per surface, `<surface> <mnemonic> <parameters...>`. Lines that
//! start with five spaces continue the previous card.

mod card;
mod reader;
mod writer;

pub use reader::DeckReader;
pub use writer::{DeckWriter, CONTINUATION};
