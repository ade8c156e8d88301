use rand::Rng;

pub const EXAMPLE_PROMPTS: [&str; 6] = [
    "A magic forest with glowing plants and fairy homes among giant mushrooms",
    "An old steampunk airship floating through golden clouds at sunset",
    "A futuristic Mars colony with glass domes and gardens",
    "A dragon sleeping on gold coins in a crystal cave",
    "A cyberpunk city with neon signs and flying cars at night",
    "A peaceful bamboo forest with a hidden ancient temple",
];

/// "Surprise me": one of [`EXAMPLE_PROMPTS`], chosen by `rng`.
pub fn pick_example_prompt<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    EXAMPLE_PROMPTS[rng.random_range(0..EXAMPLE_PROMPTS.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn seeded_pick_is_from_the_list_and_repeatable() {
        let first = pick_example_prompt(&mut StdRng::seed_from_u64(7));
        let again = pick_example_prompt(&mut StdRng::seed_from_u64(7));
        assert!(EXAMPLE_PROMPTS.contains(&first));
        assert_eq!(first, again);
    }

    #[test]
    fn every_pick_is_known() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..200 {
            assert!(EXAMPLE_PROMPTS.contains(&pick_example_prompt(&mut rng)));
        }
    }
}
