/*!
 * # 2D Operations
 *
 * This module contains the numeric primitives the denoising network is built
 * from, as free functions on tensors of shape [N, C, H, W]. Keeping them out
 * of the network struct lets the stage sequencing be tested independently of
 * the exact primitive numerics.
 */

use tch::Tensor;

/**
 * Sigmoid-weighted linear unit, `x * sigmoid(x)`. Smooth, non-monotonic and
 * saturating for large negative inputs.
 *
 * # Arguments
 * t: Tensor - The input tensor [N, C, H, W]
 *
 * # Returns
 * Tensor - The activated tensor [N, C, H, W]
 */
pub fn silu(t: &Tensor) -> Tensor {
    t.silu()
}

/**
 * Halve the spatial resolution by a 2x2 non-overlapping max-reduction.
 *
 * # Arguments
 * t: Tensor - The input tensor [N, C, H, W], H and W even
 *
 * # Returns
 * Tensor - The reduced tensor [N, C, H/2, W/2]
 */
pub fn downscale_2d(t: &Tensor) -> Tensor {
    t.max_pool2d_default(2)
}

/**
 * Double the spatial resolution by nearest-neighbour interpolation.
 *
 * # Arguments
 * t: Tensor - The input tensor [N, C, H, W]
 *
 * # Returns
 * Tensor - The enlarged tensor [N, C, 2H, 2W]
 */
pub fn upscale_2d(t: &Tensor) -> Tensor {
    let size = t.size();
    let (h, w) = (size[2], size[3]);
    t.upsample_nearest2d(&[h * 2, w * 2], None, None)
}
