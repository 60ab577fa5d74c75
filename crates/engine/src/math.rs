use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    pub fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    pub fn distance_sq(self, other: Vec3) -> f32 {
        let d = self.sub(other);
        d.x * d.x + d.y * d.y + d.z * d.z
    }

    pub fn horizontal_distance_sq(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }

    /// Rotates the vector around the vertical axis. Positive yaw turns +X toward -Z.
    pub fn rotated_yaw(self, yaw_radians: f32) -> Vec3 {
        let (sin, cos) = yaw_radians.sin_cos();
        Vec3 {
            x: self.x * cos + self.z * sin,
            y: self.y,
            z: -self.x * sin + self.z * cos,
        }
    }
}

/// How range checks measure distance. Ground-plane games usually want
/// `Horizontal` so a creature on a raised panel is still reachable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangePolicy {
    #[default]
    Horizontal,
    Full3D,
}

impl RangePolicy {
    pub fn distance_sq(self, a: Vec3, b: Vec3) -> f32 {
        match self {
            Self::Horizontal => a.horizontal_distance_sq(b),
            Self::Full3D => a.distance_sq(b),
        }
    }

    pub fn within(self, a: Vec3, b: Vec3, radius: f32) -> bool {
        self.distance_sq(a, b) <= radius * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_policy_ignores_height() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 10.0, 4.0);
        assert!((RangePolicy::Horizontal.distance_sq(a, b) - 25.0).abs() < 0.0001);
        assert!((RangePolicy::Full3D.distance_sq(a, b) - 125.0).abs() < 0.0001);
        assert!(RangePolicy::Horizontal.within(a, b, 5.0));
        assert!(!RangePolicy::Full3D.within(a, b, 5.0));
    }

    #[test]
    fn yaw_quarter_turn_maps_x_to_negative_z() {
        let rotated = Vec3::new(1.0, 0.5, 0.0).rotated_yaw(std::f32::consts::FRAC_PI_2);
        assert!(rotated.x.abs() < 0.0001);
        assert!((rotated.y - 0.5).abs() < 0.0001);
        assert!((rotated.z + 1.0).abs() < 0.0001);
    }
}
