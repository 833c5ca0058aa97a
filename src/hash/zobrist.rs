// src/hash/zobrist.rs

use crate::board::Board;
use crate::board::castle_bits::*;
use once_cell::sync::OnceCell;
use rand::{RngCore, SeedableRng, rngs::StdRng};

#[cfg(feature = "deterministic_zobrist")]
const ZOBRIST_SEED: u64 = 0x9E37_79B9_AAAC_5C87;

fn make_zobrist_rng() -> StdRng {
    #[cfg(feature = "deterministic_zobrist")]
    {
        StdRng::seed_from_u64(ZOBRIST_SEED)
    }
    #[cfg(not(feature = "deterministic_zobrist"))]
    {
        // Version-agnostic: fill a 32-byte seed from thread_rng
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        StdRng::from_seed(seed)
    }
}

#[allow(dead_code)]
pub struct ZobristKeys {
    /// [color][piece][square] with {White=0, Black=1} and {P,N,B,R,Q,K}={0..5}
    pub piece: [[[u64; 64]; 6]; 2],
    pub side_to_move: u64,
    /// [0]=K, [1]=Q, [2]=k, [3]=q  (bit order K,Q,k,q)
    pub castling: [u64; 4],
    /// a..h => 0..7
    pub ep_file: [u64; 8],
}

#[inline]
pub fn xor_castling_rights_delta(hash: &mut u64, keys: &ZobristKeys, old: u8, new_: u8) {
    let d = old ^ new_;
    if d & CASTLE_WK != 0 {
        *hash ^= keys.castling[0];
    } // K
    if d & CASTLE_WQ != 0 {
        *hash ^= keys.castling[1];
    } // Q
    if d & CASTLE_BK != 0 {
        *hash ^= keys.castling[2];
    } // k
    if d & CASTLE_BQ != 0 {
        *hash ^= keys.castling[3];
    } // q
}

/// Returns Some(file 0..7) if EP should contribute to the hash this ply; else None.
/// The en-passant square is always included once set, regardless of whether a pawn
/// can actually capture onto it -- matching the literal "ep_square is set" rule rather
/// than the capturability-gated variant used by some engines to shrink the key space.
pub fn ep_file_to_hash(board: &Board) -> Option<u8> {
    let ep = board.en_passant?;
    Some(ep.index() % 8)
}

pub struct LockKeys {
    pub piece: [[[u16; 64]; 6]; 2],
    pub side_to_move: u16,
    pub castling: [u16; 4],
    pub ep_file: [u16; 8],
}

/// Independent 16-bit keys used for the transposition-table collision lock.
/// Generated from a *separate* RNG stream than [`ZobristKeys`] so the lock is
/// not merely a slice of the wide hash's bits.
pub fn lock_keys() -> &'static LockKeys {
    static KEYS: OnceCell<LockKeys> = OnceCell::new();
    KEYS.get_or_init(|| generate_lock_keys_with_rng(make_lock_rng()))
}

#[cfg(feature = "deterministic_zobrist")]
const LOCK_SEED: u64 = 0x1234_5678_9ABC_DEF1;

fn make_lock_rng() -> StdRng {
    #[cfg(feature = "deterministic_zobrist")]
    {
        StdRng::seed_from_u64(LOCK_SEED)
    }
    #[cfg(not(feature = "deterministic_zobrist"))]
    {
        let mut seed = [0u8; 32];
        rand::rng().fill_bytes(&mut seed);
        StdRng::from_seed(seed)
    }
}

fn generate_lock_keys_with_rng(mut rng: StdRng) -> LockKeys {
    #[inline]
    fn non_zero16(r: &mut StdRng) -> u16 {
        let mut v = (r.next_u64() & 0xFFFF) as u16;
        while v == 0 {
            v = (r.next_u64() & 0xFFFF) as u16;
        }
        v
    }

    let mut keys = LockKeys {
        piece: [[[0u16; 64]; 6]; 2],
        side_to_move: 0,
        castling: [0u16; 4],
        ep_file: [0u16; 8],
    };

    for c in 0..2 {
        for p in 0..6 {
            for sq in 0..64 {
                keys.piece[c][p][sq] = non_zero16(&mut rng);
            }
        }
    }

    for i in 0..4 {
        keys.castling[i] = non_zero16(&mut rng);
    }

    for f in 0..8 {
        keys.ep_file[f] = non_zero16(&mut rng);
    }

    keys.side_to_move = non_zero16(&mut rng);

    keys
}

#[inline]
pub fn xor_castling_rights_delta_lock(hash: &mut u16, keys: &LockKeys, old: u8, new_: u8) {
    let d = old ^ new_;
    if d & CASTLE_WK != 0 {
        *hash ^= keys.castling[0];
    }
    if d & CASTLE_WQ != 0 {
        *hash ^= keys.castling[1];
    }
    if d & CASTLE_BK != 0 {
        *hash ^= keys.castling[2];
    }
    if d & CASTLE_BQ != 0 {
        *hash ^= keys.castling[3];
    }
}

// Global keys, initialized on first use.
pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(|| generate_zobrist_keys_with_rng(make_zobrist_rng()))
}

// Stub for the next step (we’ll fill the arrays soon).
fn generate_zobrist_keys_with_rng(mut rng: StdRng) -> ZobristKeys {
    #[inline]
    fn non_zero(r: &mut StdRng) -> u64 {
        // avoid zero keys to reduce degenerate collisions
        let mut v = r.next_u64();
        while v == 0 {
            v = r.next_u64();
        }
        v
    }

    let mut keys = ZobristKeys {
        piece: [[[0u64; 64]; 6]; 2],
        side_to_move: 0,
        castling: [0u64; 4], // [K,Q,k,q]
        ep_file: [0u64; 8],  // a..h => 0..7
    };

    // piece[color][piece][square]
    for c in 0..2 {
        for p in 0..6 {
            for sq in 0..64 {
                keys.piece[c][p][sq] = non_zero(&mut rng);
            }
        }
    }

    // castling: [0]=K, [1]=Q, [2]=k, [3]=q
    for i in 0..4 {
        keys.castling[i] = non_zero(&mut rng);
    }

    // en passant file keys a..h => 0..7
    for f in 0..8 {
        keys.ep_file[f] = non_zero(&mut rng);
    }

    // side to move (XOR when Black to move)
    keys.side_to_move = non_zero(&mut rng);

    keys
}
