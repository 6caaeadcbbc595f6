//! 3D simplex noise with a seeded permutation table.

use rand::Rng;
use rand::seq::SliceRandom;

const F3: f32 = 1.0 / 3.0;
const G3: f32 = 1.0 / 6.0;

/// Midpoints of the cube edges.
const GRAD3: [[f32; 3]; 12] = [
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, -1.0, 0.0],
    [1.0, 0.0, 1.0],
    [-1.0, 0.0, 1.0],
    [1.0, 0.0, -1.0],
    [-1.0, 0.0, -1.0],
    [0.0, 1.0, 1.0],
    [0.0, -1.0, 1.0],
    [0.0, 1.0, -1.0],
    [0.0, -1.0, -1.0],
];

/// Simplex noise in roughly `[-1, 1]`.
///
/// The permutation and a random input offset are drawn from the caller's
/// RNG, so a seeded RNG gives a reproducible field. The offset keeps
/// integer lattice points from always evaluating to zero.
#[derive(Debug, Clone)]
pub struct SimplexNoise {
    perm: [u8; 512],
    offset: [f32; 3],
}

impl SimplexNoise {
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut p: Vec<u8> = (0..=255).collect();
        p.shuffle(rng);

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = p[i & 255];
        }

        let offset = [
            rng.gen_range(0.0..1000.0),
            rng.gen_range(0.0..1000.0),
            rng.gen_range(0.0..1000.0),
        ];
        Self { perm, offset }
    }

    pub fn noise3(&self, x: f32, y: f32, z: f32) -> f32 {
        let x = x + self.offset[0];
        let y = y + self.offset[1];
        let z = z + self.offset[2];

        // Skew into simplex cell space.
        let s = (x + y + z) * F3;
        let i = (x + s).floor() as i32;
        let j = (y + s).floor() as i32;
        let k = (z + s).floor() as i32;

        let t = (i + j + k) as f32 * G3;
        let x0 = x - (i as f32 - t);
        let y0 = y - (j as f32 - t);
        let z0 = z - (k as f32 - t);

        // Second and third corners of the tetrahedron containing the point.
        let (c1, c2) = if x0 >= y0 {
            if y0 >= z0 {
                ([1, 0, 0], [1, 1, 0])
            } else if x0 >= z0 {
                ([1, 0, 0], [1, 0, 1])
            } else {
                ([0, 0, 1], [1, 0, 1])
            }
        } else if y0 < z0 {
            ([0, 0, 1], [0, 1, 1])
        } else if x0 < z0 {
            ([0, 1, 0], [0, 1, 1])
        } else {
            ([0, 1, 0], [1, 1, 0])
        };

        let cell = [(i & 255) as usize, (j & 255) as usize, (k & 255) as usize];
        let corners: [([usize; 3], f32); 4] = [
            ([0, 0, 0], 0.0),
            (c1, G3),
            (c2, 2.0 * G3),
            ([1, 1, 1], 3.0 * G3),
        ];

        let mut sum = 0.0;
        for (c, g) in corners {
            let dx = x0 - c[0] as f32 + g;
            let dy = y0 - c[1] as f32 + g;
            let dz = z0 - c[2] as f32 + g;
            let falloff = 0.6 - dx * dx - dy * dy - dz * dz;
            if falloff < 0.0 {
                continue;
            }
            let grad = GRAD3[self.hash(cell[0] + c[0], cell[1] + c[1], cell[2] + c[2]) % 12];
            let f2 = falloff * falloff;
            sum += f2 * f2 * (grad[0] * dx + grad[1] * dy + grad[2] * dz);
        }
        32.0 * sum
    }

    #[inline]
    fn hash(&self, i: usize, j: usize, k: usize) -> usize {
        let pk = self.perm[k] as usize;
        let pj = self.perm[j + pk] as usize;
        self.perm[i + pj] as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn noise(seed: u64) -> SimplexNoise {
        SimplexNoise::new(&mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn same_seed_same_field() {
        let (a, b) = (noise(7), noise(7));
        for n in 0..50 {
            let p = n as f32 * 0.37;
            assert_eq!(a.noise3(p, -p, p * 0.5), b.noise3(p, -p, p * 0.5));
        }
    }

    #[test]
    fn different_seeds_differ() {
        let (a, b) = (noise(1), noise(2));
        let differs = (0..50).any(|n| {
            let p = n as f32 * 0.37;
            a.noise3(p, p, p) != b.noise3(p, p, p)
        });
        assert!(differs);
    }

    #[test]
    fn stays_within_unit_range() {
        let n = noise(3);
        for step in 0..2000 {
            let p = step as f32 * 0.113;
            let v = n.noise3(p, p * 0.7 - 40.0, -p * 1.3);
            assert!(v.is_finite());
            assert!(v.abs() <= 1.1, "{v} at step {step}");
        }
    }

    #[test]
    fn is_continuous() {
        let n = noise(4);
        let a = n.noise3(12.3, 4.5, 6.7);
        let b = n.noise3(12.3 + 1e-3, 4.5, 6.7);
        assert!((a - b).abs() < 0.05);
    }

    #[test]
    fn is_not_constant() {
        let n = noise(5);
        let values: Vec<f32> = (0..20).map(|i| n.noise3(i as f32 * 0.41, 0.0, 0.0)).collect();
        let spread = values.iter().cloned().fold(f32::MIN, f32::max)
            - values.iter().cloned().fold(f32::MAX, f32::min);
        assert!(spread > 0.1);
    }
}
