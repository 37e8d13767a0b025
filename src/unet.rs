/*!
 * # UNet
 *
 * This module contains a small fixed-topology encoder-decoder network for
 * denoising [N, C, H, W] batches. Three 5x5 "same"-padded convolutions take
 * the channels in_channels -> 32 -> 64 -> 64 while max-pooling twice; three
 * transposed convolutions take them back 64 -> 64 -> 32 -> out_channels
 * while upsampling twice, each upsample adding in the matching encoder
 * feature map (skip connection). Every stage is followed by SiLU.
 */

use tch::{nn, nn::Module, Tensor};

use crate::ops_2d::{downscale_2d, silu, upscale_2d};

/// Fixed-capacity stack holding the encoder feature maps until the decoder
/// consumes them, last-in-first-out. The capacity is the number of skip
/// connections of the topology, so an unbalanced push/pop pairing panics at
/// the exact stage that broke it instead of as a shape error further down.
#[derive(Debug)]
struct SkipStack<const N: usize> {
    slots: [Option<Tensor>; N],
    len: usize,
}

impl<const N: usize> SkipStack<N> {
    fn new() -> Self {
        SkipStack {
            slots: std::array::from_fn(|_| None),
            len: 0,
        }
    }

    fn push(&mut self, t: Tensor) {
        assert!(self.len < N, "skip stack overflow: more than {N} captures");
        self.slots[self.len] = Some(t);
        self.len += 1;
    }

    fn pop(&mut self) -> Tensor {
        assert!(self.len > 0, "skip stack underflow: more pops than pushes");
        self.len -= 1;
        self.slots[self.len]
            .take()
            .expect("slot below len is always filled by a matching push")
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/**
 * A basic UNet mapping a corrupted batch [N, in_channels, H, W] to a
 * same-sized prediction [N, out_channels, H, W], interpreted downstream as
 * the predicted noise or the predicted clean signal depending on the
 * training convention.
 *
 * The topology is fixed apart from the input and output channel counts.
 * H and W must be multiples of 4 so the two poolings pair exactly with the
 * two upsamplings; the forward pass asserts this up front.
 *
 * The forward pass has no internal randomness: for fixed parameters and
 * input it is deterministic. Parameters live in the var store under the
 * path given at construction and are only ever mutated by an external
 * optimizer.
 */
#[derive(Debug)]
pub struct BasicUnet {
    down1: nn::Conv2D,
    down2: nn::Conv2D,
    down3: nn::Conv2D,
    up1: nn::ConvTranspose2D,
    up2: nn::ConvTranspose2D,
    up3: nn::ConvTranspose2D,
}

impl BasicUnet {
    pub fn new(vs: &nn::Path, in_channels: i64, out_channels: i64) -> BasicUnet {
        let conv_cfg = nn::ConvConfig {
            padding: 2,
            ..Default::default()
        };
        let deconv_cfg = nn::ConvTransposeConfig {
            padding: 2,
            ..Default::default()
        };
        BasicUnet {
            down1: nn::conv2d(vs / "down1", in_channels, 32, 5, conv_cfg),
            down2: nn::conv2d(vs / "down2", 32, 64, 5, conv_cfg),
            down3: nn::conv2d(vs / "down3", 64, 64, 5, conv_cfg),
            up1: nn::conv_transpose2d(vs / "up1", 64, 64, 5, deconv_cfg),
            up2: nn::conv_transpose2d(vs / "up2", 64, 32, 5, deconv_cfg),
            up3: nn::conv_transpose2d(vs / "up3", 32, out_channels, 5, deconv_cfg),
        }
    }
}

impl Module for BasicUnet {
    fn forward(&self, xs: &Tensor) -> Tensor {
        let size = xs.size();
        let (h, w) = (size[size.len() - 2], size[size.len() - 1]);
        assert!(
            h % 4 == 0 && w % 4 == 0 && h >= 4 && w >= 4,
            "spatial size must be a multiple of 4 to survive two halvings, got {h}x{w}"
        );

        let mut skips = SkipStack::<2>::new();

        let x = silu(&xs.apply(&self.down1));
        skips.push(x.shallow_clone());
        let x = downscale_2d(&x);
        let x = silu(&x.apply(&self.down2));
        skips.push(x.shallow_clone());
        let x = downscale_2d(&x);
        let x = silu(&x.apply(&self.down3));

        let x = silu(&x.apply(&self.up1));
        let x = upscale_2d(&x) + skips.pop();
        let x = silu(&x.apply(&self.up2));
        let x = upscale_2d(&x) + skips.pop();
        let x = silu(&x.apply(&self.up3));

        debug_assert!(skips.is_empty(), "skip captures left unconsumed");
        x
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::noise::corrupt;
    use crate::utils::{assert_eq_tensor, assert_shape};
    use tch::{Device, Kind};

    fn unet(in_channels: i64, out_channels: i64) -> (nn::VarStore, BasicUnet) {
        let vs = nn::VarStore::new(Device::Cpu);
        let net = BasicUnet::new(&vs.root(), in_channels, out_channels);
        (vs, net)
    }

    #[test]
    fn skip_stack_is_lifo() {
        let mut stack = SkipStack::<2>::new();
        assert!(stack.is_empty());
        stack.push(Tensor::from_slice(&[1.0f32]));
        stack.push(Tensor::from_slice(&[2.0f32]));
        assert!(!stack.is_empty());
        assert_eq!(f64::try_from(stack.pop()).unwrap(), 2.0);
        assert_eq!(f64::try_from(stack.pop()).unwrap(), 1.0);
        assert!(stack.is_empty());
    }

    #[test]
    #[should_panic(expected = "skip stack overflow")]
    fn skip_stack_rejects_a_third_capture() {
        let mut stack = SkipStack::<2>::new();
        stack.push(Tensor::from_slice(&[1.0f32]));
        stack.push(Tensor::from_slice(&[2.0f32]));
        stack.push(Tensor::from_slice(&[3.0f32]));
    }

    #[test]
    #[should_panic(expected = "skip stack underflow")]
    fn skip_stack_rejects_an_unmatched_pop() {
        let mut stack = SkipStack::<2>::new();
        stack.push(Tensor::from_slice(&[1.0f32]));
        let _ = stack.pop();
        let _ = stack.pop();
    }

    #[test]
    fn output_shape_matches_input_shape() {
        let _guard = tch::no_grad_guard();
        let (_vs, net) = unet(1, 1);
        for hw in [4, 8, 28] {
            let x = Tensor::rand(&[2, 1, hw, hw], (Kind::Float, Device::Cpu));
            assert_shape(&net.forward(&x), &[2, 1, hw, hw]);
        }
    }

    #[test]
    fn output_channels_follow_the_configuration() {
        let _guard = tch::no_grad_guard();
        let (_vs, net) = unet(3, 2);
        let x = Tensor::rand(&[1, 3, 8, 8], (Kind::Float, Device::Cpu));
        assert_shape(&net.forward(&x), &[1, 2, 8, 8]);
    }

    #[test]
    fn forward_is_deterministic() {
        let _guard = tch::no_grad_guard();
        let (_vs, net) = unet(1, 1);
        let x = Tensor::rand(&[2, 1, 8, 8], (Kind::Float, Device::Cpu));
        assert_eq_tensor(&net.forward(&x), &net.forward(&x));
    }

    #[test]
    fn rectangular_inputs_are_supported() {
        let _guard = tch::no_grad_guard();
        let (_vs, net) = unet(1, 1);
        let x = Tensor::rand(&[1, 1, 8, 16], (Kind::Float, Device::Cpu));
        assert_shape(&net.forward(&x), &[1, 1, 8, 16]);
    }

    #[test]
    #[should_panic(expected = "multiple of 4")]
    fn sub_minimum_spatial_size_is_rejected() {
        let _guard = tch::no_grad_guard();
        let (_vs, net) = unet(1, 1);
        let x = Tensor::rand(&[1, 1, 2, 2], (Kind::Float, Device::Cpu));
        let _ = net.forward(&x);
    }

    #[test]
    #[should_panic(expected = "multiple of 4")]
    fn odd_spatial_size_is_rejected() {
        let _guard = tch::no_grad_guard();
        let (_vs, net) = unet(1, 1);
        let x = Tensor::rand(&[1, 1, 5, 5], (Kind::Float, Device::Cpu));
        let _ = net.forward(&x);
    }

    // The workflow a training step runs: corrupt a batch with a ramp of
    // amounts, then predict from the corrupted batch.
    #[test]
    fn corrupt_then_denoise_end_to_end() {
        let _guard = tch::no_grad_guard();
        let x = Tensor::rand(&[8, 1, 28, 28], (Kind::Float, Device::Cpu));
        let amount = Tensor::linspace(0.0, 1.0, 8, (Kind::Float, Device::Cpu));

        let noisy = corrupt(&x, &amount);
        assert_shape(&noisy, &[8, 1, 28, 28]);
        // amount starts at exactly 0, so the first sample is untouched
        assert_eq_tensor(&noisy.get(0), &x.get(0));

        let (_vs, net) = unet(1, 1);
        assert_shape(&net.forward(&noisy), &[8, 1, 28, 28]);
    }
}
