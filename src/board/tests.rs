use super::*;

#[test]
fn new_board_has_standard_starting_material() {
    let board = Board::new();
    assert_eq!(board.pieces(Piece::Pawn, Color::White).count_ones(), 8);
    assert_eq!(board.pieces(Piece::Pawn, Color::Black).count_ones(), 8);
    assert_eq!(board.pieces(Piece::King, Color::White).count_ones(), 1);
    assert_eq!(board.pieces(Piece::King, Color::Black).count_ones(), 1);
    assert_eq!(board.side_to_move, Color::White);
    assert!(board.validate().is_ok());
}

#[test]
fn king_square_finds_the_king() {
    let board = Board::new();
    assert_eq!(board.king_square(Color::White).to_string(), "e1");
    assert_eq!(board.king_square(Color::Black).to_string(), "e8");
}

#[test]
fn zobrist_hash_is_internally_consistent() {
    let board = Board::new();
    assert_eq!(board.zobrist, board.compute_zobrist_full());
}

#[test]
fn validate_rejects_overlapping_bitboards() {
    let mut board = Board::new();
    let e2 = Square::from_file_rank(4, 1);
    let queen_bb = board.bb(Color::White, Piece::Queen) | e2.bb();
    board.set_bb(Color::White, Piece::Queen, queen_bb);
    assert!(board.validate().is_err());
}

#[test]
fn empty_board_has_no_repetitions() {
    let board = Board::new();
    assert_eq!(board.repetition_count(), 1);
    assert!(!board.is_threefold());
}

#[test]
fn derived_fields_round_trip_through_make_unmake() {
    use crate::moves::execute::{make_move_basic, undo_move_basic};
    use crate::moves::types::{DOUBLE_PAWN_PUSH, Move};

    let mut board = Board::new();
    let before = (board.mg, board.eg, board.phase, board.bishop_count, board.pawn_hash, board.lock);

    let mv = Move {
        from: Square::from_file_rank(4, 1),
        to: Square::from_file_rank(4, 3),
        piece: Piece::Pawn,
        promotion: None,
        flags: DOUBLE_PAWN_PUSH,
    };

    let undo = make_move_basic(&mut board, mv);
    board.assert_derived();
    assert_ne!(board.mg, before.0, "pawn push should move the midgame PSQT term");

    undo_move_basic(&mut board, undo);
    board.assert_derived();
    let after = (board.mg, board.eg, board.phase, board.bishop_count, board.pawn_hash, board.lock);
    assert_eq!(before, after, "all derived fields must be bitwise-restored by unmake");
}
