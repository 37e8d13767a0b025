use tch::Tensor;

pub fn assert_eq_tensor(a: &Tensor, b: &Tensor) {
    assert_eq!(a.size(), b.size(), "Tensors must have the same shape");
    let delta = f64::try_from((a - b).abs().max()).unwrap();
    assert!(delta < 1e-5, "Tensors must be equal, max delta {delta}");
}

pub fn assert_shape(t: &Tensor, shape: &[i64]) {
    assert_eq!(t.size().as_slice(), shape, "Unexpected tensor shape");
}
