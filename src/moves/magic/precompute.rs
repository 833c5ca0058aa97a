use rand::{RngCore, SeedableRng, rngs::StdRng};

use super::attacks::{bishop_attacks_per_square, rook_attacks_per_square};
use super::search::find_magic_number_for_square;
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};

/// How to seed the RNG used while searching for magic numbers.
pub enum MagicTableSeed {
    /// Deterministic seed, used by tests so the generated tables are reproducible.
    Fixed(u64),
    /// Seeded from the OS RNG, for normal runtime use.
    Random,
}

fn make_rng(seed: MagicTableSeed) -> StdRng {
    match seed {
        MagicTableSeed::Fixed(s) => StdRng::seed_from_u64(s),
        MagicTableSeed::Random => {
            let mut raw = [0u8; 32];
            rand::rng().fill_bytes(&mut raw);
            StdRng::from_seed(raw)
        }
    }
}

const ROOK_DIRS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRS: [(isize, isize); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Relevant-occupancy mask for a sliding piece: every square it could be blocked by,
/// excluding the board edge in each ray direction (edge squares never need a blocker bit
/// because the ray always terminates there regardless of occupancy).
fn relevant_mask(square: usize, dirs: [(isize, isize); 4]) -> u64 {
    let rank = (square / 8) as isize;
    let file = (square % 8) as isize;
    let mut mask = 0u64;

    for (dr, df) in dirs {
        let mut r = rank + dr;
        let mut f = file + df;
        while (1..7).contains(&r) && (1..7).contains(&f) {
            mask |= 1u64 << (r * 8 + f);
            r += dr;
            f += df;
        }
    }

    mask
}

/// Enumerates every subset of `mask` via the standard carry-rippler trick.
fn subsets_of(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1 << mask.count_ones());
    let mut subset: u64 = 0;
    loop {
        subsets.push(subset);
        if subset == mask {
            break;
        }
        subset = (subset.wrapping_sub(mask)) & mask;
    }
    subsets
}

fn build_entry<R: RngCore>(
    square: usize,
    dirs: [(isize, isize); 4],
    attacks_fn: fn(usize, u64) -> u64,
    rng: &mut R,
) -> Result<MagicEntry, String> {
    let mask = relevant_mask(square, dirs);
    let bits = mask.count_ones();
    let shift = 64 - bits;

    let blockers = subsets_of(mask);
    let attacks: Vec<u64> = blockers
        .iter()
        .map(|&b| attacks_fn(square, b))
        .collect();

    let magic = find_magic_number_for_square(&blockers, &attacks, shift, rng)?;

    let mut table = vec![0u64; 1 << bits];
    for (b, a) in blockers.iter().zip(attacks.iter()) {
        let index = ((b.wrapping_mul(magic)) >> shift) as usize;
        table[index] = *a;
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

pub fn generate_magic_tables(seed: MagicTableSeed) -> Result<MagicTables, String> {
    let mut rng = make_rng(seed);

    let mut rook_entries = Vec::with_capacity(64);
    let mut bishop_entries = Vec::with_capacity(64);

    for square in 0..64 {
        rook_entries.push(build_entry(
            square,
            ROOK_DIRS,
            rook_attacks_per_square,
            &mut rng,
        )?);
        bishop_entries.push(build_entry(
            square,
            BISHOP_DIRS,
            bishop_attacks_per_square,
            &mut rng,
        )?);
    }

    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tables_match_scan_for_every_square() {
        let tables = generate_magic_tables(MagicTableSeed::Fixed(0x45)).unwrap();
        for square in 0..64 {
            let blockers = relevant_mask(square, ROOK_DIRS);
            for subset in subsets_of(blockers).into_iter().take(8) {
                let expected = rook_attacks_per_square(square, subset);
                let got = tables.rook.get_attacks(square, subset);
                assert_eq!(got, expected, "rook mismatch at square {square}");
            }
        }
    }
}
