//! Scene lights.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Distance-based falloff `1 / (constant + linear * d + quadratic * d²)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attenuation {
    /// Constant term.
    pub constant: f32,
    /// Linear term.
    pub linear: f32,
    /// Quadratic term.
    pub quadratic: f32,
}

/// Reference falloff terms by light range: (distance, linear, quadratic).
const ATTENUATION_TABLE: [(f32, f32, f32); 12] = [
    (7.0, 0.7, 1.8),
    (13.0, 0.35, 0.44),
    (20.0, 0.22, 0.20),
    (32.0, 0.14, 0.07),
    (50.0, 0.09, 0.032),
    (65.0, 0.07, 0.017),
    (100.0, 0.045, 0.0075),
    (160.0, 0.027, 0.0028),
    (200.0, 0.022, 0.0019),
    (325.0, 0.014, 0.0007),
    (600.0, 0.007, 0.0002),
    (3250.0, 0.0014, 0.000007),
];

impl Default for Attenuation {
    fn default() -> Self {
        Self::covering(160.0)
    }
}

impl Attenuation {
    /// Terms from the reference table for the smallest range reaching `distance`.
    /// Distances past the table use its last row.
    pub fn covering(distance: f32) -> Self {
        let (_, linear, quadratic) = ATTENUATION_TABLE
            .iter()
            .copied()
            .find(|&(range, _, _)| range >= distance)
            .unwrap_or(ATTENUATION_TABLE[ATTENUATION_TABLE.len() - 1]);
        Self {
            constant: 1.0,
            linear,
            quadratic,
        }
    }

    /// Falloff factor at `distance`.
    pub fn factor(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

/// Infinitely distant light shining along `direction`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalLight {
    /// Direction the light travels.
    pub direction: Vec3,
    /// Point the shadow frustum is centered on.
    pub look_at: Vec3,
    /// Ambient color.
    pub ambient: Vec3,
    /// Diffuse color.
    pub diffuse: Vec3,
    /// Specular color.
    pub specular: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-0.4, -1.0, -0.3),
            look_at: Vec3::ZERO,
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::splat(0.7),
            specular: Vec3::splat(0.5),
        }
    }
}

/// Cone light with smooth edge and distance falloff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    /// World position.
    pub position: Vec3,
    /// Cone axis.
    pub direction: Vec3,
    /// Ambient color.
    pub ambient: Vec3,
    /// Diffuse color.
    pub diffuse: Vec3,
    /// Specular color.
    pub specular: Vec3,
    /// Cosine of the inner cone angle.
    pub cut_off_cos: f32,
    /// Cosine of the outer cone angle.
    pub outer_cut_off_cos: f32,
    /// Distance falloff.
    pub attenuation: Attenuation,
}

impl SpotLight {
    /// White spot light with the default falloff.
    pub fn new(position: Vec3, direction: Vec3, cut_off_cos: f32, outer_cut_off_cos: f32) -> Self {
        Self {
            position,
            direction,
            ambient: Vec3::splat(0.05),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::ONE,
            cut_off_cos,
            outer_cut_off_cos,
            attenuation: Attenuation::default(),
        }
    }
}

/// The single active scene light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Light {
    /// Sun-like light.
    Directional(DirectionalLight),
    /// Cone light.
    Spot(SpotLight),
}

impl Default for Light {
    fn default() -> Self {
        Light::Directional(DirectionalLight::default())
    }
}

impl Light {
    /// Direction light travels.
    pub fn direction(&self) -> Vec3 {
        match self {
            Light::Directional(light) => light.direction,
            Light::Spot(light) => light.direction,
        }
    }

    /// Eye position of the shadow camera.
    pub fn shadow_eye(&self) -> Vec3 {
        match self {
            Light::Directional(light) => light.look_at - light.direction,
            Light::Spot(light) => light.position,
        }
    }

    /// Point the shadow camera looks at.
    pub fn shadow_target(&self) -> Vec3 {
        match self {
            Light::Directional(light) => light.look_at,
            Light::Spot(light) => light.position + light.direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attenuation_picks_covering_row() {
        let att = Attenuation::covering(50.0);
        assert_eq!((att.constant, att.linear, att.quadratic), (1.0, 0.09, 0.032));

        let att = Attenuation::covering(51.0);
        assert_eq!(att.linear, 0.07);

        let far = Attenuation::covering(10_000.0);
        assert_eq!(far.quadratic, 0.000007);

        assert!(Attenuation::default().factor(0.0) == 1.0);
    }

    #[test]
    fn directional_shadow_eye_sits_behind_target() {
        let light = Light::Directional(DirectionalLight {
            direction: Vec3::new(0.0, -2.0, 0.0),
            look_at: Vec3::new(5.0, 0.0, 5.0),
            ..Default::default()
        });
        assert_eq!(light.shadow_eye(), Vec3::new(5.0, 2.0, 5.0));
        assert_eq!(light.shadow_target(), Vec3::new(5.0, 0.0, 5.0));
    }
}
