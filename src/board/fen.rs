use super::fen_tables::{CHAR_TO_PC, PC_TO_CHAR};
use super::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece};
use crate::square::Square;

impl Board {
    /// Replaces this board's contents with the position described by a FEN string.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), String> {
        let mut fields = fen.split_whitespace();

        let placement = fields.next().ok_or("FEN missing piece placement field")?;
        let side = fields.next().unwrap_or("w");
        let castling = fields.next().unwrap_or("-");
        let ep = fields.next().unwrap_or("-");
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let mut board = Board::new_empty();
        board.side_to_move = Color::White;
        board.castling_rights = 0;
        board.en_passant = None;

        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(format!(
                "FEN piece placement must have 8 ranks, got {}",
                ranks.len()
            ));
        }

        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top as u8;
            let mut file: u8 = 0;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                    continue;
                }
                if file >= 8 {
                    return Err(format!("FEN rank '{}' overflows the board", rank_str));
                }
                let (piece, color) = CHAR_TO_PC[c as usize]
                    .ok_or_else(|| format!("invalid FEN piece glyph '{}'", c))?;
                let sq = Square::from_file_rank(file, rank);
                let bb = board.bb(color, piece) | sq.bb();
                board.set_bb(color, piece, bb);
                file += 1;
            }
            if file != 8 {
                return Err(format!("FEN rank '{}' does not cover 8 files", rank_str));
            }
        }

        board.side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("invalid side-to-move field '{}'", other)),
        };

        if castling != "-" {
            for c in castling.chars() {
                match c {
                    'K' => board.castling_rights |= CASTLE_WK,
                    'Q' => board.castling_rights |= CASTLE_WQ,
                    'k' => board.castling_rights |= CASTLE_BK,
                    'q' => board.castling_rights |= CASTLE_BQ,
                    other => return Err(format!("invalid castling glyph '{}'", other)),
                }
            }
        }

        if ep != "-" {
            if ep.len() != 2 {
                return Err(format!("invalid en passant square '{}'", ep));
            }
            let mut chars = ep.chars();
            let file_ch = chars.next().unwrap();
            let rank_ch = chars.next().unwrap();
            if !('a'..='h').contains(&file_ch) || !('1'..='8').contains(&rank_ch) {
                return Err(format!("invalid en passant square '{}'", ep));
            }
            let file = file_ch as u8 - b'a';
            let rank = rank_ch as u8 - b'1';
            board.en_passant = Some(Square::from_file_rank(file, rank));
        }

        board.halfmove_clock = halfmove
            .parse()
            .map_err(|_| format!("invalid halfmove clock '{}'", halfmove))?;
        board.fullmove_number = fullmove
            .parse()
            .map_err(|_| format!("invalid fullmove number '{}'", fullmove))?;

        board.refresh_derived();
        board.history.clear();

        *self = board;
        Ok(())
    }

    /// Serializes this board to a FEN string.
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank_from_top in 0..8u8 {
            let rank = 7 - rank_from_top;
            let mut empty_run = 0u8;
            for file in 0..8u8 {
                let sq = Square::from_file_rank(file, rank);
                match self.piece_at(sq) {
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            placement.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        let idx = (color as usize) * 6 + (piece as usize);
                        placement.push(PC_TO_CHAR[idx]);
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                placement.push_str(&empty_run.to_string());
            }
            if rank_from_top != 7 {
                placement.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };

        let mut castling = String::new();
        if self.has_castling(CASTLE_WK) {
            castling.push('K');
        }
        if self.has_castling(CASTLE_WQ) {
            castling.push('Q');
        }
        if self.has_castling(CASTLE_BK) {
            castling.push('k');
        }
        if self.has_castling(CASTLE_BQ) {
            castling.push('q');
        }
        if castling.is_empty() {
            castling.push('-');
        }

        let ep = match self.en_passant {
            Some(sq) => sq.to_string(),
            None => "-".to_string(),
        };

        format!(
            "{} {} {} {} {} {}",
            placement, side, castling, ep, self.halfmove_clock, self.fullmove_number
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn round_trips_startpos() {
        let board = Board::from_str_checked(STARTPOS);
        assert_eq!(board.to_fen(), STARTPOS);
    }

    #[test]
    fn parses_en_passant_square() {
        let fen = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3";
        let board = Board::from_str_checked(fen);
        assert_eq!(board.en_passant.map(|s| s.to_string()), Some("d6".to_string()));
    }

    #[test]
    fn rejects_malformed_placement() {
        let mut board = Board::new_empty();
        assert!(board.set_fen("not-a-fen w - - 0 1").is_err());
    }

    impl Board {
        fn from_str_checked(fen: &str) -> Board {
            let mut b = Board::new_empty();
            b.set_fen(fen).expect("valid FEN in test");
            b
        }
    }
}
