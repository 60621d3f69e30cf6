use rand::Rng;
use shared::HALF_MAP;

///Represents a vector or position in the 2D world plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    ///Value along the x-axis.
    pub x: f32,
    ///Value along the y-axis.
    /// Positive direction is down, matching screen coordinates.
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Vec2 { x, y }
    }

    ///Returns the magnitude of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    ///Returns the normalized vector, or zero for a zero vector.
    pub fn normalize(&self) -> Vec2 {
        let mag = self.magnitude();
        if mag == 0.0 {
            Vec2::ZERO
        } else {
            Vec2 {
                x: self.x / mag,
                y: self.y / mag,
            }
        }
    }

    ///Returns the scaled vector.
    pub fn scale(&self, scalar: f32) -> Vec2 {
        Vec2 {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }

    ///Returns the sum of two vectors.
    pub fn add(&self, other: &Vec2) -> Vec2 {
        Vec2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    ///Returns the vector pointing from `self` to `other`.
    pub fn to(&self, other: &Vec2) -> Vec2 {
        Vec2 {
            x: other.x - self.x,
            y: other.y - self.y,
        }
    }

    ///Squared Euclidean distance, used for all range checks.
    pub fn distance_sq(&self, other: &Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    ///Clamps both axes into the map bounds.
    pub fn clamp_to_map(&self) -> Vec2 {
        Vec2 {
            x: self.x.clamp(-HALF_MAP, HALF_MAP),
            y: self.y.clamp(-HALF_MAP, HALF_MAP),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    ///Unit vector pointing at `angle` radians.
    pub fn from_angle(angle: f32) -> Vec2 {
        Vec2 {
            x: angle.cos(),
            y: angle.sin(),
        }
    }
}

///Returns a uniformly random position inside the map.
pub fn random_position<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2 {
        x: rng.gen_range(-HALF_MAP..=HALF_MAP),
        y: rng.gen_range(-HALF_MAP..=HALF_MAP),
    }
}

///Returns a unit vector with a uniformly random heading.
pub fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
    Vec2::from_angle(rng.gen_range(0.0..std::f32::consts::TAU))
}
