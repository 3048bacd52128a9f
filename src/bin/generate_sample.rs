use anyhow::{Context, Result};
use serde_json::json;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Fake per-component estimate: the true value plus statistical noise.
fn estimate(truth: f64, err: f64, rng: &mut SimpleRng) -> (f64, f64) {
    (rng.gauss(truth, err), err * (0.9 + 0.2 * rng.next_f64()))
}

fn main() -> Result<()> {
    env_logger::init();

    let mut rng = SimpleRng::new(42);

    let temperatures: Vec<f64> = (0..10).map(|i| 1.0 + i as f64 * 0.25).collect();
    let sizes = [8_i64, 16];

    let mut tasks = Vec::new();
    for &size in &sizes {
        for (ti, &temp) in temperatures.iter().enumerate() {
            let parameters = json!({
                "T": temp,
                "Lx": size,
                "model": "ising",
                "sweeps": 100_000,
            });

            // Leave the hottest task of each size unmerged.
            if ti == temperatures.len() - 1 {
                tasks.push(json!({ "parameters": parameters, "results": null }));
                continue;
            }

            let (e_mean, e_err) = estimate(-1.5 / temp, 0.002, &mut rng);
            let (m_mean, m_err) = estimate((2.5 - temp).max(0.0) / 2.5, 0.005, &mut rng);

            // Correlation function: one entry per distance up to L/2, so its
            // length depends on the system size.
            let mut corr_mean = Vec::new();
            let mut corr_err = Vec::new();
            for d in 1..=(size / 2) {
                let (m, e) = estimate((-(d as f64) / temp).exp(), 0.003, &mut rng);
                corr_mean.push(m);
                corr_err.push(e);
            }

            tasks.push(json!({
                "parameters": parameters,
                "results": {
                    "Energy": {
                        "mean": [e_mean], "error": [e_err],
                        "rebin_len": 100, "rebin_count": 900,
                        "autocorr_time": 1.0 + 4.0 / temp,
                    },
                    "Magnetization": {
                        "mean": [m_mean], "error": [m_err],
                        "rebin_len": 100, "rebin_count": 900,
                        "autocorr_time": 1.0 + 6.0 / temp,
                    },
                    "Correlation": {
                        "mean": corr_mean, "error": corr_err,
                        "rebin_len": 100, "rebin_count": 900,
                    },
                }
            }));
        }
    }

    let output_path = "sample.results.json";
    let text = serde_json::to_string_pretty(&tasks)?;
    std::fs::write(output_path, text)
        .with_context(|| format!("writing {output_path}"))?;

    println!(
        "Wrote {} tasks ({} sizes x {} temperatures) to {output_path}",
        tasks.len(),
        sizes.len(),
        temperatures.len()
    );
    Ok(())
}
