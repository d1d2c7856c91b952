use num::Float;

/// `y += a * x`
///
/// # Arguments
/// * `a` - スカラー
/// * `x` - 入力ベクトル
/// * `y` - 加算先ベクトル
#[inline]
pub fn axpy<N, R>(a: R, x: &[N], y: &mut [R])
where
    N: Into<R> + Copy,
    R: Float,
{
    debug_assert_eq!(
        x.len(),
        y.len(),
        "Vectors must be of the same length to compute axpy."
    );
    for (acc, &v) in y.iter_mut().zip(x.iter()) {
        *acc = *acc + a * v.into();
    }
}

/// L2ノルム
#[inline]
pub fn l2_norm<R: Float>(v: &[R]) -> R {
    v.iter().fold(R::zero(), |acc, &x| acc + x * x).sqrt()
}

/// 各要素を `s` で割る
#[inline]
pub fn div_scalar<R: Float>(v: &mut [R], s: R) {
    for x in v.iter_mut() {
        *x = *x / s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axpy_accumulates_into_wider_type() {
        let x = [1.0f32, -2.0, 0.5];
        let mut y = [0.0f64; 3];
        axpy(2.0, &x, &mut y);
        axpy(1.0, &x, &mut y);
        assert_eq!(y, [3.0, -6.0, 1.5]);
    }

    #[test]
    fn norm_and_division() {
        let mut v = [3.0f64, 4.0];
        assert_eq!(l2_norm(&v), 5.0);
        div_scalar(&mut v, 5.0);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-12);
    }
}
