pub mod cable;
pub mod fittings;
pub mod outcome;
pub mod runs;
pub mod scale;
