use super::precompute::{MagicTableSeed, generate_magic_tables};
use super::structs::MagicTables;

#[cfg(feature = "deterministic_magic")]
const MAGIC_SEED: u64 = 0xC0FF_EE15_BEEF_5EED;

/// Builds the magic bitboard tables used for sliding-piece attack lookups.
///
/// With the `deterministic_magic` feature, a fixed seed is used so repeated
/// calls within a process (and across processes) produce identical tables.
pub fn load_magic_tables() -> MagicTables {
    #[cfg(feature = "deterministic_magic")]
    let seed = MagicTableSeed::Fixed(MAGIC_SEED);
    #[cfg(not(feature = "deterministic_magic"))]
    let seed = MagicTableSeed::Random;

    generate_magic_tables(seed).expect("magic number search should always converge for 64 squares")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_magic_tables_is_usable_for_queen_attacks() {
        let tables = load_magic_tables();
        let attacks = tables.queen_attacks(27, 0);
        assert_ne!(attacks, 0);
    }
}
