use crate::utils::hash::{assignment_key, fnv1a_32};

const MULBERRY_INCREMENT: u32 = 0x6d2b_79f5;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Mulberry32: a single 32-bit state word, advanced by a fixed constant per draw.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(MULBERRY_INCREMENT);
        let s = self.state;
        let mut t = (s ^ (s >> 15)).wrapping_mul(1 | s);
        t = t.wrapping_add((t ^ (t >> 7)).wrapping_mul(61 | t)) ^ t;
        t ^ (t >> 14)
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }
}

/// Random function seeded from `(student_id, paper_id)`.
///
/// The same pair always produces the same sequence, in any process.
pub fn seeded_random(student_id: &str, paper_id: &str) -> impl FnMut() -> f64 + use<> {
    let mut generator = Mulberry32::new(fnv1a_32(&assignment_key(student_id, paper_id)));
    move || generator.next_f64()
}

/// Fisher–Yates shuffle driven only by `random`.
///
/// Walks from the last index down to 1 drawing exactly one value per step and
/// swaps with `floor(r * (i + 1))`. Returns a new vector; `items` is untouched.
pub fn shuffle<T, F>(items: &[T], mut random: F) -> Vec<T>
where
    T: Clone,
    F: FnMut() -> f64,
{
    let mut shuffled = items.to_vec();
    for i in (1..shuffled.len()).rev() {
        let j = (random() * (i + 1) as f64).floor() as usize;
        // Guard against a random function that strays outside [0, 1).
        shuffled.swap(i, j.min(i));
    }
    shuffled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mulberry32_reference_sequence() {
        let mut zero = Mulberry32::new(0);
        assert_eq!(zero.next_u32(), 1_144_304_738);
        assert_eq!(zero.next_u32(), 1_416_247);

        let mut generator = Mulberry32::new(0xd6e5_cb7d);
        let raw: Vec<u32> = (0..4).map(|_| generator.next_u32()).collect();
        assert_eq!(raw, vec![4_032_714_311, 1_517_059_540, 3_217_278_347, 1_853_396_900]);
    }

    #[test]
    fn test_seeded_random_floats() {
        let mut random = seeded_random("stu-1", "paper-1");
        assert_eq!(random(), 0.9389394687023014);
        assert_eq!(random(), 0.3532179491594434);
        assert_eq!(random(), 0.7490809883456677);
        assert_eq!(random(), 0.43152759317308664);
    }

    #[test]
    fn test_seeded_random_stays_in_unit_interval() {
        let mut random = seeded_random("anyone", "anything");
        for _ in 0..10_000 {
            let value = random();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_shuffle_with_zero_random_rotates_left() {
        let input = ["e0", "e1", "e2", "e3", "e4"];
        let shuffled = shuffle(&input, || 0.0);
        assert_eq!(shuffled, vec!["e1", "e2", "e3", "e4", "e0"]);
        // Input untouched.
        assert_eq!(input, ["e0", "e1", "e2", "e3", "e4"]);
    }

    #[test]
    fn test_shuffle_draws_once_per_step() {
        let mut draws = 0;
        let _ = shuffle(&[1, 2, 3, 4, 5, 6], || {
            draws += 1;
            0.5
        });
        assert_eq!(draws, 5);

        let mut draws = 0;
        let single = shuffle(&[42], || {
            draws += 1;
            0.5
        });
        assert_eq!(single, vec![42]);
        assert_eq!(draws, 0);
    }

    #[test]
    fn test_shuffle_seeded_reference_permutation() {
        let items: Vec<u32> = (0..10).collect();
        let shuffled = shuffle(&items, seeded_random("stu-1", "paper-1"));
        assert_eq!(shuffled, vec![7, 0, 2, 6, 1, 4, 8, 5, 3, 9]);
    }
}
