/*!
 * # Noise
 *
 * This module contains the corruption transform a denoising training loop
 * feeds its network with: a per-sample linear blend between a clean batch
 * and uniform noise.
 */

use rand::{distributions, Rng, SeedableRng};
use tch::Tensor;

/**
 * Blend a clean batch with a caller-supplied noise tensor.
 *
 * The deterministic core of [`corrupt`]; use it directly when the noise draw
 * must be reproducible (see [`uniform_noise_like`]).
 *
 * # Arguments
 * x: Tensor - The clean batch [N, C, H, W]
 * amount: Tensor - The blend ratio per sample [N]
 * noise: Tensor - The noise to blend in [N, C, H, W]
 *
 * # Returns
 * Tensor - `x * (1 - amount) + noise * amount` [N, C, H, W]
 */
pub fn corrupt_with_noise(x: &Tensor, amount: &Tensor, noise: &Tensor) -> Tensor {
    // [N] -> [N, 1, 1, 1] so the ratio broadcasts over channels and pixels
    let amount = amount.view([-1, 1, 1, 1]);
    x * (1.0 - &amount) + noise * &amount
}

/**
 * Corrupt a clean batch with fresh uniform noise.
 *
 * The noise is drawn uniform over [0, 1), element-wise independent, on every
 * call; repeated calls with identical inputs give different outputs. At
 * `amount = 0` the output is `x`, at `amount = 1` it is the noise draw.
 * `amount` is not clamped: values outside [0, 1] extrapolate the blend
 * linearly, which noise schedules may rely on.
 *
 * # Arguments
 * x: Tensor - The clean batch [N, C, H, W]
 * amount: Tensor - The blend ratio per sample [N]
 *
 * # Returns
 * Tensor - The corrupted batch [N, C, H, W]
 */
pub fn corrupt(x: &Tensor, amount: &Tensor) -> Tensor {
    corrupt_with_noise(x, amount, &x.rand_like())
}

/**
 * Generate a seeded uniform-[0, 1) noise tensor shaped like `x`.
 *
 * # Arguments
 * x: Tensor - The tensor whose shape, kind and device to match
 * seed: u64 - The seed for the random number generator
 *
 * # Returns
 * Tensor - The noise tensor, same shape as `x`
 */
pub fn uniform_noise_like(x: &Tensor, seed: u64) -> Tensor {
    let rng = rand::rngs::StdRng::seed_from_u64(seed);
    let noise = rng
        .sample_iter(distributions::Uniform::new(0.0, 1.0))
        .take(x.numel())
        .collect::<Vec<f64>>();

    Tensor::from_slice(&noise)
        .view(x.size().as_slice())
        .to_device(x.device())
        .to_kind(x.kind())
}
