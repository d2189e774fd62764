use rand::SeedableRng;
use rand::prelude::StdRng;

/// Helper option to create a rng from a variety of sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum RngSource {
    /// Build a new rng from the system.
    #[default]
    Default,

    /// The rng is built from a seed.
    Seed(u64),

    /// The rng is passed as-is.
    Rng(StdRng),
}

impl From<RngSource> for StdRng {
    fn from(source: RngSource) -> Self {
        match source {
            RngSource::Default => StdRng::from_os_rng(),
            RngSource::Seed(seed) => StdRng::seed_from_u64(seed),
            RngSource::Rng(rng) => rng,
        }
    }
}

impl From<u64> for RngSource {
    fn from(seed: u64) -> Self {
        Self::Seed(seed)
    }
}

impl From<StdRng> for RngSource {
    fn from(rng: StdRng) -> Self {
        Self::Rng(rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rng_source_from_seed_is_deterministic() {
        assert_eq!(RngSource::from(42), RngSource::Seed(42));

        let a: StdRng = RngSource::from(42).into();
        let b: StdRng = RngSource::from(42).into();
        assert_eq!(a, b);
    }

    #[test]
    fn rng_source_from_rng_passes_through() {
        let rng = StdRng::seed_from_u64(7);
        let source = RngSource::from(rng.clone());

        assert_eq!(source, RngSource::Rng(rng.clone()));
        assert_eq!(<RngSource as Into<StdRng>>::into(source), rng);
    }
}
