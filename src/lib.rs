/*!
 * # Tch-denoise - A toy denoising core for the tch-rs crate
 *
 * The two pieces a denoising training loop calls into, and nothing else:
 * - Noise : blend a clean batch with fresh uniform noise by a per-sample amount
 * - UNet : a small fixed-topology encoder-decoder predicting a same-shaped residual
 *
 * Dataset loading, device selection and visualization are left to the caller.
 *
 * ## Conventions
 *
 * ### Shapes
 * - N : The number of samples
 * - C : The number of channels
 * - H : The height of the image
 * - W : The width of the image
 *
 * - [N, C, H, W] : A tensor of shape [N, C, H, W] is a batch of N images of shape [C, H, W]
 *                  A tensor of multiple samples with one channel will never be represented
 *                  as [N, H, W] but as [N, 1, H, W]
 * - [N] : A tensor of shape [N] holds one scalar per sample of the batch
 *
 * ### Errors
 *
 * Shape and type mismatches surface as panics from the underlying tch
 * primitives and are never caught or translated here. The computations are
 * deterministic in shape, so a failing call fails identically on retry.
 */

pub mod noise;
pub mod ops_2d;
pub mod unet;
pub mod utils;
