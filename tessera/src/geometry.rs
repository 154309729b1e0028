//! Positional data.
//!
//! Positions and normals are plain triplets of `f32`, which is the
//! representation used by the binary buffer layout. Topology never depends on
//! positions; this module only supports derived quantities like face normals.

pub type Position = [f32; 3];
pub type Normal = [f32; 3];

/// Compares triplets by the bit patterns of their components.
pub(crate) fn bit_eq(a: &[f32; 3], b: &[f32; 3]) -> bool {
    a.iter().zip(b).all(|(a, b)| a.to_bits() == b.to_bits())
}

pub(crate) fn normal_bit_eq(a: &Option<Normal>, b: &Option<Normal>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => bit_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// Computes the normal of a polygon using Newell's method.
///
/// Newell's method is robust for non-planar and concave polygons. Returns
/// `None` if the polygon has fewer than three positions or zero area.
pub fn newell_normal<I>(positions: I) -> Option<Normal>
where
    I: IntoIterator<Item = Position>,
    I::IntoIter: Clone,
{
    let positions = positions.into_iter();
    let mut n = [0.0f32; 3];
    let mut count = 0usize;
    let first = positions.clone().next()?;
    let mut iter = positions.peekable();
    while let Some(a) = iter.next() {
        let b = iter.peek().copied().unwrap_or(first);
        n[0] += (a[1] - b[1]) * (a[2] + b[2]);
        n[1] += (a[2] - b[2]) * (a[0] + b[0]);
        n[2] += (a[0] - b[0]) * (a[1] + b[1]);
        count += 1;
    }
    if count < 3 {
        return None;
    }
    let magnitude = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if magnitude > 0.0 && magnitude.is_finite() {
        Some([n[0] / magnitude, n[1] / magnitude, n[2] / magnitude])
    }
    else {
        None
    }
}
