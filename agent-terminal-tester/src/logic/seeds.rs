use anyhow::{Result, bail};

pub const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed tokens into concrete seeds.
///
/// Supports literal integers (negative values use their magnitude) and the
/// keyword `random`, which draws a fresh seed for this run. Duplicates are
/// dropped, keeping the first occurrence.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let seed = if token.eq_ignore_ascii_case("random") {
            rand::random::<u64>()
        } else if let Ok(value) = token.parse::<u64>() {
            value
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }

    Ok(seeds)
}

/// Seed for one iteration of a scenario run.
pub fn iteration_seed(seed: u64, iteration: usize) -> u64 {
    seed.wrapping_add(u64::try_from(iteration).unwrap_or(u64::MAX))
}
