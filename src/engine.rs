//! Host-facing engine facade: position exchange, legal move enumeration,
//! move application, and search, expressed in the external (UI) data formats
//! rather than the internal bitboard representation.

use crate::board::castle_bits::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
use crate::board::{Board, Color, Piece};
use crate::book::PolyglotBook;
use crate::moves::execute::{generate_legal, make_move_basic};
use crate::moves::magic::MagicTables;
use crate::moves::magic::loader::load_magic_tables;
use crate::moves::types::Move;
use crate::search::search::search;
use crate::search::tt::TranspositionTable;
use crate::square::Square;
use crate::status::{GameStatus, position_status};
use std::time::Duration;

pub const SQ_NONE: u8 = 0xFF;

/// Host callback surface. The search's own clock (`TimeManager`, backed by
/// `Instant`) is already monotonic and is what actually gates time-limited
/// search; no field here is consulted by `think`. Reserved for host
/// callbacks this facade doesn't yet need.
#[derive(Default, Clone)]
pub struct Hooks {}

/// `board[row][col]` with row 0 = rank 8, row 7 = rank 1. Signed pieces:
/// Pawn=1..King=6 for white, negated for black, 0 for empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiPosition {
    pub board: [[i8; 8]; 8],
    pub turn: i8,
    pub castling: u8,
    pub ep_row: u8,
    pub ep_col: u8,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

impl UiPosition {
    fn piece_code(piece: Piece) -> i8 {
        match piece {
            Piece::Pawn => 1,
            Piece::Knight => 2,
            Piece::Bishop => 3,
            Piece::Rook => 4,
            Piece::Queen => 5,
            Piece::King => 6,
        }
    }

    fn piece_from_code(code: i8) -> Option<Piece> {
        match code.abs() {
            1 => Some(Piece::Pawn),
            2 => Some(Piece::Knight),
            3 => Some(Piece::Bishop),
            4 => Some(Piece::Rook),
            5 => Some(Piece::Queen),
            6 => Some(Piece::King),
            _ => None,
        }
    }
}

/// Engine move format matching the host's flag conventions: independent bit
/// flags rather than the internal compact 4-bit encoding, plus a 2-bit
/// promotion-type field occupying bits 4-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineMove {
    pub from_row: u8,
    pub from_col: u8,
    pub to_row: u8,
    pub to_col: u8,
    pub flags: u8,
}

pub const MOVE_FLAG_CAPTURE: u8 = 1 << 0;
pub const MOVE_FLAG_CASTLE: u8 = 1 << 1;
pub const MOVE_FLAG_EN_PASSANT: u8 = 1 << 2;
pub const MOVE_FLAG_PROMOTION: u8 = 1 << 3;

fn promo_type_bits(p: Piece) -> u8 {
    match p {
        Piece::Knight => 0,
        Piece::Bishop => 1,
        Piece::Rook => 2,
        Piece::Queen => 3,
        _ => 3,
    }
}

fn promo_from_type_bits(bits: u8) -> Piece {
    match bits {
        0 => Piece::Knight,
        1 => Piece::Bishop,
        2 => Piece::Rook,
        _ => Piece::Queen,
    }
}

fn square_to_row_col(sq: Square) -> (u8, u8) {
    // Row 0 = rank 8, so row = 7 - rank.
    (7 - sq.rank(), sq.file())
}

fn row_col_to_square(row: u8, col: u8) -> Square {
    Square::from_file_rank(col, 7 - row)
}

impl EngineMove {
    pub fn from_internal(mv: &Move) -> Self {
        let (from_row, from_col) = square_to_row_col(mv.from);
        let (to_row, to_col) = square_to_row_col(mv.to);

        let mut flags = 0u8;
        if mv.is_capture() {
            flags |= MOVE_FLAG_CAPTURE;
        }
        if mv.is_castling() {
            flags |= MOVE_FLAG_CASTLE;
        }
        if mv.is_en_passant() {
            flags |= MOVE_FLAG_EN_PASSANT;
        }
        if let Some(p) = mv.promotion {
            flags |= MOVE_FLAG_PROMOTION;
            flags |= promo_type_bits(p) << 4;
        }

        EngineMove {
            from_row,
            from_col,
            to_row,
            to_col,
            flags,
        }
    }

    fn promotion(&self) -> Option<Piece> {
        if self.flags & MOVE_FLAG_PROMOTION != 0 {
            Some(promo_from_type_bits((self.flags >> 4) & 0b11))
        } else {
            None
        }
    }
}

/// Rook source/destination for a castle, reported so the host can animate it
/// without mutating the board. `None` if `mv` is not a castle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveEffects {
    pub rook_from: Option<(u8, u8)>,
    pub rook_to: Option<(u8, u8)>,
    pub ep_captured_square: Option<(u8, u8)>,
}

/// `NORMAL=0, CHECK=1, CHECKMATE=2, STALEMATE=3, DRAW_50=4, DRAW_REP=5, DRAW_MAT=6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusCode {
    Normal = 0,
    Check = 1,
    Checkmate = 2,
    Stalemate = 3,
    Draw50 = 4,
    DrawRep = 5,
    DrawMat = 6,
}

fn status_to_code(status: GameStatus, in_check: bool) -> StatusCode {
    match status {
        GameStatus::Checkmate => StatusCode::Checkmate,
        GameStatus::Stalemate => StatusCode::Stalemate,
        GameStatus::DrawFiftyMove | GameStatus::DrawSeventyFiveMove => StatusCode::Draw50,
        GameStatus::DrawThreefold | GameStatus::DrawFivefold => StatusCode::DrawRep,
        GameStatus::DrawDeadPosition => StatusCode::DrawMat,
        GameStatus::InPlay => {
            if in_check {
                StatusCode::Check
            } else {
                StatusCode::Normal
            }
        }
    }
}

/// Root-move search options. Both are opt-in and default to strict best-move
/// selection.
#[derive(Default, Clone, Copy)]
pub struct RootOptions {
    /// Collect root moves within this many centipawns of the best and choose
    /// uniformly at random among them.
    pub move_variance_cp: Option<i32>,
    /// Bounded random jitter applied to each root move's score before the
    /// variance comparison, so near-equal moves aren't always ranked the
    /// same way across searches.
    pub eval_noise_cp: Option<i32>,
}

pub struct Engine {
    tables: MagicTables,
    board: Board,
    tt: TranspositionTable,
    book: Option<PolyglotBook>,
    hooks: Hooks,
    pub root_options: RootOptions,
}

impl Engine {
    /// Initializes Zobrist/lock/magic tables (if not already resident),
    /// clears search state, clears the TT, and resets the board to empty.
    pub fn init(hooks: Hooks) -> Self {
        let _ = crate::hash::zobrist::zobrist_keys();
        let _ = crate::hash::zobrist::lock_keys();

        Engine {
            tables: load_magic_tables(),
            board: Board::new_empty(),
            tt: TranspositionTable::new(64),
            book: None,
            hooks,
            root_options: RootOptions::default(),
        }
    }

    pub fn with_book(mut self, book: PolyglotBook) -> Self {
        self.book = Some(book);
        self
    }

    /// Resets the board to the starting position and clears the repetition
    /// history. The history holds ancestor positions since the last
    /// irreversible move; the current position is implicit and counted
    /// separately by `repetition_count`, so a cleared history means zero
    /// recorded ancestors, not a single starting entry.
    pub fn new_game(&mut self) {
        self.board = Board::new();
        self.tt.clear();
    }

    /// Loads an external position, rebuilding the board and hashes from
    /// scratch and clearing the repetition history, leaving no recorded
    /// ancestors (the loaded position itself is implicit, per
    /// `repetition_count`'s convention).
    pub fn set_position(&mut self, pos: &UiPosition) {
        let mut board = Board::new_empty();

        for row in 0..8u8 {
            for col in 0..8u8 {
                let code = pos.board[row as usize][col as usize];
                if code == 0 {
                    continue;
                }
                let piece = match UiPosition::piece_from_code(code) {
                    Some(p) => p,
                    None => continue,
                };
                let color = if code > 0 { Color::White } else { Color::Black };
                let sq = row_col_to_square(row, col);
                let bb = board.bb(color, piece) | sq.bb();
                board.set_bb(color, piece, bb);
            }
        }

        board.side_to_move = if pos.turn >= 0 {
            Color::White
        } else {
            Color::Black
        };

        board.castling_rights = pos.castling
            & (CASTLE_WK | CASTLE_WQ | CASTLE_BK | CASTLE_BQ);

        board.en_passant = if pos.ep_row == SQ_NONE || pos.ep_col == SQ_NONE {
            None
        } else {
            Some(row_col_to_square(pos.ep_row, pos.ep_col))
        };

        board.halfmove_clock = pos.halfmove_clock;
        board.fullmove_number = pos.fullmove_number;

        board.refresh_derived();
        board.history.clear();

        self.board = board;
    }

    /// Projects the current board back into the external grid form.
    pub fn get_position(&self) -> UiPosition {
        let mut grid = [[0i8; 8]; 8];
        for row in 0..8u8 {
            for col in 0..8u8 {
                let sq = row_col_to_square(row, col);
                if let Some((color, piece)) = self.board.piece_at(sq) {
                    let code = UiPosition::piece_code(piece);
                    grid[row as usize][col as usize] = if color == Color::White {
                        code
                    } else {
                        -code
                    };
                }
            }
        }

        let (ep_row, ep_col) = match self.board.en_passant {
            Some(sq) => square_to_row_col(sq),
            None => (SQ_NONE, SQ_NONE),
        };

        UiPosition {
            board: grid,
            turn: if self.board.side_to_move == Color::White {
                1
            } else {
                -1
            },
            castling: self.board.castling_rights,
            ep_row,
            ep_col,
            halfmove_clock: self.board.halfmove_clock,
            fullmove_number: self.board.fullmove_number,
        }
    }

    fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::with_capacity(64);
        let mut scratch = Vec::with_capacity(256);
        let mut board_copy = self.board.clone();
        generate_legal(&mut board_copy, &self.tables, &mut moves, &mut scratch);
        moves
    }

    pub fn get_all_moves(&self) -> Vec<EngineMove> {
        self.legal_moves()
            .iter()
            .map(EngineMove::from_internal)
            .collect()
    }

    pub fn get_moves_from(&self, row: u8, col: u8) -> Vec<EngineMove> {
        let from_sq = row_col_to_square(row, col);
        self.legal_moves()
            .iter()
            .filter(|m| m.from == from_sq)
            .map(EngineMove::from_internal)
            .collect()
    }

    fn find_matching(&self, mv: &EngineMove) -> Option<Move> {
        let from_sq = row_col_to_square(mv.from_row, mv.from_col);
        let to_sq = row_col_to_square(mv.to_row, mv.to_col);
        let promotion = mv.promotion();

        self.legal_moves()
            .into_iter()
            .find(|m| m.from == from_sq && m.to == to_sq && m.promotion == promotion)
    }

    pub fn is_legal_move(&self, mv: &EngineMove) -> bool {
        self.find_matching(mv).is_some()
    }

    /// Reports the rook move for a castle and the captured-pawn square for an
    /// en-passant capture, without mutating the board.
    pub fn get_move_effects(&self, mv: &EngineMove) -> MoveEffects {
        let Some(internal) = self.find_matching(mv) else {
            return MoveEffects::default();
        };

        let mut fx = MoveEffects::default();

        if internal.is_castling() {
            let to_idx = internal.to.index();
            let (rook_from, rook_to) = match to_idx {
                6 => (Square::from_index(7), Square::from_index(5)),
                2 => (Square::from_index(0), Square::from_index(3)),
                62 => (Square::from_index(63), Square::from_index(61)),
                58 => (Square::from_index(56), Square::from_index(59)),
                _ => return fx,
            };
            fx.rook_from = Some(square_to_row_col(rook_from));
            fx.rook_to = Some(square_to_row_col(rook_to));
        } else if internal.is_en_passant() {
            let to_idx = internal.to.index();
            let color = self.board.color_at(internal.from);
            let cap_idx = match color {
                Some(Color::White) => to_idx - 8,
                _ => to_idx + 8,
            };
            fx.ep_captured_square = Some(square_to_row_col(Square::from_index(cap_idx)));
        }

        fx
    }

    /// Applies `mv` after verifying it against the legal move list; returns
    /// the resulting status, or `None` if the move does not match a legal
    /// move (no state mutation in that case).
    pub fn make_move(&mut self, mv: &EngineMove) -> Option<StatusCode> {
        let internal = self.find_matching(mv)?;
        make_move_basic(&mut self.board, internal);
        Some(self.get_status())
    }

    pub fn get_status(&mut self) -> StatusCode {
        let status = position_status(&mut self.board, &self.tables);
        let in_check = crate::moves::square_control::in_check(
            &self.board,
            self.board.side_to_move,
            &self.tables,
        );
        status_to_code(status, in_check)
    }

    /// Returns a book move if one is known for the current position,
    /// otherwise runs iterative deepening under the given limits. A sentinel
    /// move with `from_row == SQ_NONE` signals no legal move.
    pub fn think(&mut self, max_depth: i32, max_time_ms: Option<u32>) -> EngineMove {
        if let Some(book) = &self.book
            && let Some(book_move) = book.probe(&self.board)
        {
            return EngineMove::from_internal(&book_move);
        }

        let time_limit = max_time_ms.map(|ms| Duration::from_millis(ms as u64));

        let (best_score, best_move) =
            search(&mut self.board, &self.tables, &mut self.tt, max_depth, time_limit);

        let Some(mv) = best_move else {
            return EngineMove {
                from_row: SQ_NONE,
                from_col: SQ_NONE,
                to_row: SQ_NONE,
                to_col: SQ_NONE,
                flags: 0,
            };
        };

        let Some(margin) = self.root_options.move_variance_cp else {
            return EngineMove::from_internal(&mv);
        };

        self.pick_varianced_root_move(
            max_depth,
            time_limit,
            best_score,
            margin,
            self.root_options.eval_noise_cp,
        )
        .unwrap_or_else(|| EngineMove::from_internal(&mv))
    }

    /// Re-searches every root move at the same depth to find all candidates
    /// within `margin` centipawns of `best_score`, then picks one uniformly
    /// at random. Used only when `root_options.move_variance_cp` is set.
    fn pick_varianced_root_move(
        &mut self,
        max_depth: i32,
        time_limit: Option<Duration>,
        best_score: i32,
        margin: i32,
        eval_noise_cp: Option<i32>,
    ) -> Option<EngineMove> {
        use crate::moves::execute::undo_move_basic;
        use rand::Rng;

        let mut candidates = Vec::new();
        for mv in self.legal_moves() {
            let undo = make_move_basic(&mut self.board, mv);
            let (score, _) = search(
                &mut self.board,
                &self.tables,
                &mut self.tt,
                (max_depth - 1).max(1),
                time_limit,
            );
            undo_move_basic(&mut self.board, undo);

            let mut move_score = -score;
            if let Some(noise) = eval_noise_cp
                && noise > 0
            {
                move_score += rand::rng().random_range(-noise..=noise);
            }

            if best_score - move_score <= margin {
                candidates.push(mv);
            }
        }

        if candidates.is_empty() {
            return None;
        }

        let idx = rand::rng().random_range(0..candidates.len());
        Some(EngineMove::from_internal(&candidates[idx]))
    }
}
