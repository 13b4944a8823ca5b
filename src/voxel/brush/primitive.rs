use glam::Vec3;

use crate::math::Aabb;
use crate::voxel::sdf::Sdf;
use crate::voxel::voxel::Axis;

/// Brush primitive shapes with SDF evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrushPrimitive {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    Capsule { radius: f32, half_height: f32, axis: Axis },
    Cylinder { radius: f32, half_height: f32, axis: Axis },
}

impl BrushPrimitive {
    /// Signed distance from point to surface (negative = inside)
    /// Point is in local space (primitive centered at origin)
    pub fn sdf(&self, local_point: Vec3) -> f32 {
        match self {
            BrushPrimitive::Sphere { radius } => local_point.length() - radius,
            BrushPrimitive::Box { half_extents } => {
                let q = local_point.abs() - *half_extents;
                q.max(Vec3::ZERO).length() + q.x.max(q.y.max(q.z)).min(0.0)
            }
            BrushPrimitive::Capsule {
                radius,
                half_height,
                axis,
            } => {
                // Project point onto axis, clamp to segment
                let axis_vec = axis.to_vec3();
                let t = local_point.dot(axis_vec).clamp(-*half_height, *half_height);
                (local_point - axis_vec * t).length() - radius
            }
            BrushPrimitive::Cylinder {
                radius,
                half_height,
                axis,
            } => {
                let axis_vec = axis.to_vec3();
                let h = local_point.dot(axis_vec);
                let d_radial = (local_point - axis_vec * h).length() - radius;
                let d_height = h.abs() - half_height;
                let outside = Vec3::new(d_radial.max(0.0), d_height.max(0.0), 0.0).length();
                let inside = d_radial.max(d_height).min(0.0);
                outside + inside
            }
        }
    }

    /// Check if point is inside primitive (SDF <= 0)
    pub fn contains_point(&self, local_point: Vec3) -> bool {
        self.sdf(local_point) <= 0.0
    }

    /// Get local-space AABB (primitive centered at origin)
    pub fn local_bounds(&self) -> Aabb {
        match self {
            BrushPrimitive::Sphere { radius } => {
                Aabb::from_center_half_extent(Vec3::ZERO, Vec3::splat(*radius))
            }
            BrushPrimitive::Box { half_extents } => {
                Aabb::from_center_half_extent(Vec3::ZERO, *half_extents)
            }
            BrushPrimitive::Capsule {
                radius,
                half_height,
                axis,
            } => {
                let half = axis.to_vec3() * *half_height + Vec3::splat(*radius);
                Aabb::from_center_half_extent(Vec3::ZERO, half)
            }
            BrushPrimitive::Cylinder {
                radius,
                half_height,
                axis,
            } => {
                let axis_vec = axis.to_vec3();
                // Radial extent only applies off-axis
                let half = axis_vec * *half_height + (Vec3::ONE - axis_vec) * *radius;
                Aabb::from_center_half_extent(Vec3::ZERO, half)
            }
        }
    }
}

impl Sdf for BrushPrimitive {
    #[inline]
    fn eval(&self, p: Vec3) -> f32 {
        self.sdf(p)
    }

    fn bounds(&self) -> Aabb {
        self.local_bounds()
    }
}
