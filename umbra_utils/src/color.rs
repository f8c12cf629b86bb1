use glamx::{Vec3, Vec4};

/// 8-bit RGBA color.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const GRAY: Color = Color::new(130, 130, 130, 255);
    pub const BLANK: Color = Color::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Broadcasts a `0..=1` intensity to RGB with full alpha.
    pub fn from_intensity(intensity: f32) -> Self {
        let v = (intensity.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::new(v, v, v, 255)
    }

    /// Component-wise modulation, `self * tint / 255`.
    pub fn tinted(self, tint: Color) -> Self {
        let mul = |a: u8, b: u8| ((a as u16 * b as u16) / 255) as u8;
        Self {
            r: mul(self.r, tint.r),
            g: mul(self.g, tint.g),
            b: mul(self.b, tint.b),
            a: mul(self.a, tint.a),
        }
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    pub fn to_vec3(self) -> Vec3 {
        self.to_vec4().truncate()
    }
}
