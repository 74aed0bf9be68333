use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

use crate::error::GeneratorError;

pub const TICKER_LEN: u32 = 3;
const ALPHABET: u8 = 26;

/// Number of distinct tickers of `TICKER_LEN` uppercase letters.
pub const NAME_SPACE: usize = (ALPHABET as usize).pow(TICKER_LEN);

fn random_ticker<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..TICKER_LEN)
        .map(|_| (b'A' + rng.gen_range(0..ALPHABET)) as char)
        .collect()
}

/// Draws `n` distinct random tickers, in the order they were first drawn.
///
/// Collisions are redrawn. Requests larger than [`NAME_SPACE`] fail up
/// front instead of spinning forever.
pub fn allocate_names<R: Rng + ?Sized>(n: usize, rng: &mut R) -> Result<Vec<String>, GeneratorError> {
    if n > NAME_SPACE {
        return Err(GeneratorError::NameSpaceExhausted {
            requested: n,
            capacity: NAME_SPACE,
        });
    }

    let mut seen = HashSet::with_capacity(n);
    let mut names = Vec::with_capacity(n);
    let mut collisions = 0u64;

    while names.len() < n {
        let name = random_ticker(rng);
        if seen.insert(name.clone()) {
            names.push(name);
        } else {
            collisions += 1;
        }
    }

    debug!("Allocated {} tickers ({} collisions redrawn)", names.len(), collisions);
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_allocates_exact_count_of_unique_names() {
        let mut rng = StdRng::seed_from_u64(7);
        let names = allocate_names(500, &mut rng).unwrap();

        assert_eq!(names.len(), 500);
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), 500);
        for name in &names {
            assert_eq!(name.len(), 3);
            assert!(name.bytes().all(|b| b.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_whole_name_space_can_be_allocated() {
        let mut rng = StdRng::seed_from_u64(1);
        let names = allocate_names(NAME_SPACE, &mut rng).unwrap();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), 17576);
    }

    #[test]
    fn test_exhausted_name_space_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let res = allocate_names(NAME_SPACE + 1, &mut rng);
        assert!(matches!(
            res,
            Err(GeneratorError::NameSpaceExhausted { requested: 17577, capacity: 17576 })
        ));
    }

    #[test]
    fn test_same_seed_same_names() {
        let a = allocate_names(20, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = allocate_names(20, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }
}
