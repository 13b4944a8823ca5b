//! Composite brushes built from primitives with smooth CSG

use glam::Vec3;

use super::BrushPrimitive;
use crate::math::Aabb;
use crate::voxel::sdf::{OffsetSdf, Sdf, smax, smin};

/// How an element combines with the shape built so far
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsgOp {
    #[default]
    Union,
    Difference,
}

#[derive(Debug, Clone, Copy)]
struct BrushElement {
    shape: OffsetSdf<BrushPrimitive>,
    op: CsgOp,
    blend: f32,
}

/// Ordered list of placed primitives, folded left to right.
///
/// `blend` is the smoothing radius of the smooth min/max used for each
/// element; zero gives a hard union or difference.
#[derive(Debug, Clone, Default)]
pub struct CustomBrush {
    elements: Vec<BrushElement>,
}

impl CustomBrush {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a primitive centered at `offset`
    pub fn add(&mut self, primitive: BrushPrimitive, offset: Vec3, op: CsgOp, blend: f32) -> &mut Self {
        self.elements.push(BrushElement {
            shape: OffsetSdf::new(primitive, offset),
            op,
            blend: blend.max(0.0),
        });
        self
    }

    /// Builder-style [`CustomBrush::add`]
    pub fn with(mut self, primitive: BrushPrimitive, offset: Vec3, op: CsgOp, blend: f32) -> Self {
        self.add(primitive, offset, op, blend);
        self
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn max_blend(&self) -> f32 {
        self.elements.iter().map(|e| e.blend).fold(0.0, f32::max)
    }
}

impl Sdf for CustomBrush {
    fn eval(&self, p: Vec3) -> f32 {
        self.elements.iter().fold(f32::INFINITY, |d, e| {
            let de = e.shape.eval(p);
            match e.op {
                CsgOp::Union => smin(d, de, e.blend),
                CsgOp::Difference => smax(d, -de, e.blend),
            }
        })
    }

    /// Union of the additive elements, grown by the largest blend radius
    /// since smoothing can bulge past either operand.
    fn bounds(&self) -> Aabb {
        self.elements
            .iter()
            .filter(|e| e.op == CsgOp::Union)
            .map(|e| e.shape.bounds())
            .reduce(|a, b| a.merged(&b))
            .map(|b| b.grown(self.max_blend()))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(radius: f32) -> BrushPrimitive {
        BrushPrimitive::Sphere { radius }
    }

    #[test]
    fn test_empty_brush() {
        let brush = CustomBrush::new();
        assert!(brush.is_empty());
        assert!(brush.eval(Vec3::ZERO) > 0.0);
        assert_eq!(brush.bounds(), Aabb::default());
    }

    #[test]
    fn test_hard_union() {
        let brush = CustomBrush::new()
            .with(sphere(1.0), Vec3::new(-2.0, 0.0, 0.0), CsgOp::Union, 0.0)
            .with(sphere(1.0), Vec3::new(2.0, 0.0, 0.0), CsgOp::Union, 0.0);

        assert_eq!(brush.len(), 2);
        assert!(brush.eval(Vec3::new(-2.0, 0.0, 0.0)) < 0.0);
        assert!(brush.eval(Vec3::new(2.0, 0.0, 0.0)) < 0.0);
        assert!(brush.eval(Vec3::ZERO) > 0.0);
        assert_eq!(brush.bounds().min, Vec3::new(-3.0, -1.0, -1.0));
        assert_eq!(brush.bounds().max, Vec3::new(3.0, 1.0, 1.0));
    }

    #[test]
    fn test_smooth_union_bridges_gap() {
        let hard = CustomBrush::new()
            .with(sphere(1.0), Vec3::new(-1.1, 0.0, 0.0), CsgOp::Union, 0.0)
            .with(sphere(1.0), Vec3::new(1.1, 0.0, 0.0), CsgOp::Union, 0.0);
        let smooth = CustomBrush::new()
            .with(sphere(1.0), Vec3::new(-1.1, 0.0, 0.0), CsgOp::Union, 0.0)
            .with(sphere(1.0), Vec3::new(1.1, 0.0, 0.0), CsgOp::Union, 1.0);

        assert!(hard.eval(Vec3::ZERO) > 0.0);
        assert!(smooth.eval(Vec3::ZERO) < 0.0);
        assert!((smooth.bounds().max.x - 3.1).abs() < 1e-5);
    }

    #[test]
    fn test_difference() {
        let brush = CustomBrush::new()
            .with(sphere(2.0), Vec3::ZERO, CsgOp::Union, 0.0)
            .with(sphere(1.0), Vec3::ZERO, CsgOp::Difference, 0.0);

        assert!(brush.eval(Vec3::ZERO) > 0.0); // Hollow center
        assert!(brush.eval(Vec3::new(1.5, 0.0, 0.0)) < 0.0); // Shell
        assert!(brush.eval(Vec3::new(3.0, 0.0, 0.0)) > 0.0);
        // Subtracted elements do not widen the bound
        assert_eq!(brush.bounds().max, Vec3::splat(2.0));
    }
}
