// THEORY:
// The `scorer` module is the analytical heart of the monitor: it quantifies
// how much the scene changed between two consecutive snapshots. The score is
// the average per-pixel color distance, where each pixel contributes the sum
// of the absolute R, G and B channel differences (alpha is carried in the
// buffer but never compared). The scale therefore runs from 0.0 (identical
// frames) to 765.0 (every channel of every pixel fully flipped), and the
// average makes the score independent of the raster resolution.
//
// The scorer itself is a thin stateful shell around that pure function: it
// remembers exactly one prior snapshot. The first frame after start only
// primes that memory; every later frame is scored against the prior and then
// becomes the new prior, on every branch, including ticks that alert.

use tracing::warn;

use crate::core_modules::snapshot::{BYTES_PER_PIXEL, Snapshot};

/// Average per-pixel summed absolute RGB difference between two snapshots.
pub type ChangeMagnitude = f64;

/// Upper bound of the magnitude scale: three channels fully flipped.
pub const MAX_MAGNITUDE: ChangeMagnitude = 765.0;

/// What feeding one snapshot to the scorer produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// The snapshot was stored as the new comparison base; no score exists
    /// yet. Happens on the first frame of a session and after a re-prime.
    Primed,
    /// A scored comparison against the previous snapshot.
    Scored(ChangeMagnitude),
}

/// Computes the change magnitude between two snapshots of the same raster.
/// Symmetric in its arguments: `change_magnitude(a, b) == change_magnitude(b, a)`.
pub fn change_magnitude(current: &Snapshot, prior: &Snapshot) -> ChangeMagnitude {
    debug_assert_eq!(current.size(), prior.size());
    if current.pixel_count() == 0 {
        return 0.0;
    }
    // u64 cannot overflow here: 765 per pixel times u32::MAX pixels is
    // still far below u64::MAX.
    let mut total: u64 = 0;
    for (cur, prev) in current
        .rgba()
        .chunks_exact(BYTES_PER_PIXEL)
        .zip(prior.rgba().chunks_exact(BYTES_PER_PIXEL))
    {
        let dr = cur[0].abs_diff(prev[0]) as u64;
        let dg = cur[1].abs_diff(prev[1]) as u64;
        let db = cur[2].abs_diff(prev[2]) as u64;
        total += dr + dg + db;
    }
    total as f64 / current.pixel_count() as f64
}

/// Holds the previous snapshot between ticks and scores each new one
/// against it.
#[derive(Debug, Default)]
pub struct ChangeScorer {
    prior: Option<Snapshot>,
}

impl ChangeScorer {
    pub fn new() -> Self {
        Self { prior: None }
    }

    /// Feeds the next captured snapshot.
    ///
    /// The first snapshot after construction (or a reset) only primes the
    /// comparison base. A snapshot whose raster differs from the stored base
    /// re-primes instead of comparing; sessions keep a fixed raster, so this
    /// only happens when a source misbehaves.
    pub fn observe(&mut self, current: Snapshot) -> Observation {
        let observation = match &self.prior {
            Some(prior) if prior.size() == current.size() => {
                Observation::Scored(change_magnitude(&current, prior))
            }
            Some(prior) => {
                warn!(
                    prior = ?prior.size(),
                    current = ?current.size(),
                    "snapshot raster changed mid-session; re-priming scorer"
                );
                Observation::Primed
            }
            None => Observation::Primed,
        };
        self.prior = Some(current);
        observation
    }

    /// The snapshot most recently observed, if any.
    pub fn latest(&self) -> Option<&Snapshot> {
        self.prior.as_ref()
    }

    /// Drops the comparison base; the next observation primes again.
    pub fn reset(&mut self) {
        self.prior = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::snapshot::RasterSize;

    fn flat(size: RasterSize, level: u8) -> Snapshot {
        Snapshot::filled(size, [level, level, level, 255])
    }

    fn patterned(size: RasterSize, seed: usize) -> Snapshot {
        let data: Vec<u8> = (0..size.byte_len()).map(|i| ((i * seed) % 251) as u8).collect();
        Snapshot::from_rgba(size, data).unwrap()
    }

    #[test]
    fn identical_snapshots_score_zero() {
        let size = RasterSize::new(8, 8);
        let a = patterned(size, 7);
        assert_eq!(change_magnitude(&a, &a), 0.0);
    }

    #[test]
    fn magnitude_is_symmetric() {
        let size = RasterSize::new(8, 8);
        let a = patterned(size, 7);
        let b = patterned(size, 13);
        assert_eq!(change_magnitude(&a, &b), change_magnitude(&b, &a));
    }

    #[test]
    fn black_to_white_scores_full_scale() {
        let size = RasterSize::new(100, 100);
        let black = flat(size, 0);
        let white = flat(size, 255);
        assert_eq!(change_magnitude(&white, &black), MAX_MAGNITUDE);
    }

    #[test]
    fn alpha_channel_is_ignored() {
        let size = RasterSize::new(4, 4);
        let opaque = Snapshot::filled(size, [90, 90, 90, 255]);
        let transparent = Snapshot::filled(size, [90, 90, 90, 0]);
        assert_eq!(change_magnitude(&opaque, &transparent), 0.0);
    }

    #[test]
    fn single_pixel_change_is_averaged() {
        let size = RasterSize::new(2, 2);
        let base = flat(size, 0);
        let mut data = base.rgba().to_vec();
        // Bump one pixel's red channel by 40.
        data[0] = 40;
        let moved = Snapshot::from_rgba(size, data).unwrap();
        assert_eq!(change_magnitude(&moved, &base), 10.0);
    }

    #[test]
    fn first_observation_primes() {
        let size = RasterSize::new(4, 4);
        let mut scorer = ChangeScorer::new();
        assert_eq!(scorer.observe(flat(size, 50)), Observation::Primed);
        assert!(scorer.latest().is_some());
    }

    #[test]
    fn prior_is_replaced_every_tick() {
        let size = RasterSize::new(4, 4);
        let mut scorer = ChangeScorer::new();
        scorer.observe(flat(size, 0));
        assert_eq!(
            scorer.observe(flat(size, 255)),
            Observation::Scored(MAX_MAGNITUDE)
        );
        // The white frame is now the base, so a second white frame is calm.
        assert_eq!(scorer.observe(flat(size, 255)), Observation::Scored(0.0));
    }

    #[test]
    fn raster_change_reprimes() {
        let mut scorer = ChangeScorer::new();
        scorer.observe(flat(RasterSize::new(4, 4), 0));
        assert_eq!(
            scorer.observe(flat(RasterSize::new(2, 2), 255)),
            Observation::Primed
        );
        assert_eq!(
            scorer.observe(flat(RasterSize::new(2, 2), 255)),
            Observation::Scored(0.0)
        );
    }

    #[test]
    fn reset_drops_the_base() {
        let size = RasterSize::new(4, 4);
        let mut scorer = ChangeScorer::new();
        scorer.observe(flat(size, 0));
        scorer.reset();
        assert_eq!(scorer.observe(flat(size, 255)), Observation::Primed);
    }
}
