//! Signed distance fields used as sculpting brushes.
//!
//! An [`Sdf`] returns a signed distance (negative inside) and an axis-aligned
//! bound outside of which it is guaranteed positive. Evaluation happens from
//! many chunk jobs at once, so implementations must be pure and `Sync`.

use glam::{Mat4, Quat, Vec3};

use crate::math::Aabb;

/// Signed distance function with a conservative bound
pub trait Sdf: Send + Sync {
    /// Signed distance at `p` (negative = inside)
    fn eval(&self, p: Vec3) -> f32;

    /// Region outside of which `eval` is non-negative
    fn bounds(&self) -> Aabb;

    fn min(&self) -> Vec3 {
        self.bounds().min
    }

    fn max(&self) -> Vec3 {
        self.bounds().max
    }
}

impl<S: Sdf + ?Sized> Sdf for &S {
    fn eval(&self, p: Vec3) -> f32 {
        (**self).eval(p)
    }

    fn bounds(&self) -> Aabb {
        (**self).bounds()
    }
}

impl<S: Sdf + ?Sized> Sdf for Box<S> {
    fn eval(&self, p: Vec3) -> f32 {
        (**self).eval(p)
    }

    fn bounds(&self) -> Aabb {
        (**self).bounds()
    }
}

/// Moves an SDF by a rigid transform (rotation + translation).
///
/// Scaling would break the distance metric and is not supported.
#[derive(Debug, Clone)]
pub struct TransformSdf<S> {
    inner: S,
    transform: Mat4,
    inverse: Mat4,
}

impl<S: Sdf> TransformSdf<S> {
    pub fn new(inner: S, position: Vec3, rotation: Quat) -> Self {
        let transform = Mat4::from_rotation_translation(rotation, position);
        Self {
            inner,
            transform,
            inverse: transform.inverse(),
        }
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: Sdf> Sdf for TransformSdf<S> {
    #[inline]
    fn eval(&self, p: Vec3) -> f32 {
        self.inner.eval(self.inverse.transform_point3(p))
    }

    fn bounds(&self) -> Aabb {
        self.inner.bounds().transformed(&self.transform)
    }
}

/// Translates an SDF
#[derive(Debug, Clone, Copy)]
pub struct OffsetSdf<S> {
    inner: S,
    offset: Vec3,
}

impl<S: Sdf> OffsetSdf<S> {
    pub fn new(inner: S, offset: Vec3) -> Self {
        Self { inner, offset }
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }
}

impl<S: Sdf> Sdf for OffsetSdf<S> {
    #[inline]
    fn eval(&self, p: Vec3) -> f32 {
        self.inner.eval(p - self.offset)
    }

    fn bounds(&self) -> Aabb {
        let b = self.inner.bounds();
        Aabb::new(b.min + self.offset, b.max + self.offset)
    }
}

/// Surface normal by central differences, zero where the field is flat
pub fn gradient<S: Sdf + ?Sized>(sdf: &S, p: Vec3, eps: f32) -> Vec3 {
    let dx = sdf.eval(p + Vec3::X * eps) - sdf.eval(p - Vec3::X * eps);
    let dy = sdf.eval(p + Vec3::Y * eps) - sdf.eval(p - Vec3::Y * eps);
    let dz = sdf.eval(p + Vec3::Z * eps) - sdf.eval(p - Vec3::Z * eps);
    Vec3::new(dx, dy, dz).normalize_or_zero()
}

// =============================================================================
// SDF Combinations
// =============================================================================

/// Smooth minimum (polynomial smooth blend)
#[inline]
pub fn smin(a: f32, b: f32, k: f32) -> f32 {
    if k <= 0.0 {
        return a.min(b);
    }
    let h = (k - (b - a).abs()).max(0.0) / k;
    b.min(a) - h * h * k * 0.25
}

/// Smooth maximum
#[inline]
pub fn smax(a: f32, b: f32, k: f32) -> f32 {
    -smin(-a, -b, k)
}
