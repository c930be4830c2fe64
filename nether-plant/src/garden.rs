//! A row of plants grown from one master seed
//!
//! Plant `i` uses seed `master_seed + 1000 * (i + 1)` and alternates between
//! upright (even) and spreading (odd) bias curves. Plants are centred on the
//! origin along X, each tinted from the bark gradient, over an optional
//! noise ground.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::color::{Gradient, Rgb};
use crate::error::{PlantError, Result};
use crate::leaves::LeafCanopySettings;
use crate::mesh::export::with_obj_file;
use crate::mesh::{GroundSettings, MeshData, build_ground_mesh};
use crate::plant::{Plant, build_plant};
use crate::settings::{PlantSettings, orthotropic_bias, plagiotropic_bias};

/// Seed stride between neighbouring plants
const SEED_STRIDE: u64 = 1000;
/// Gardens always grow at least this many orders
const MIN_GARDEN_ORDERS: u32 = 3;

/// Garden layout parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenSettings {
    pub master_seed: u64,
    pub plant_count: u32,
    /// Distance between neighbouring plants along X
    pub x_spacing: f32,
    /// Template for every plant; seed and bias are replaced per plant
    pub plant: PlantSettings,
    /// Bark colour from the first plant (0) to the last (1)
    pub bark_gradient: Gradient,
    pub ground: GroundSettings,
    /// Grow leaves on every plant
    pub decorate: bool,
    pub leaves: LeafCanopySettings,
}

impl Default for GardenSettings {
    fn default() -> Self {
        Self {
            master_seed: 42,
            plant_count: 3,
            x_spacing: 8.0,
            plant: PlantSettings::default(),
            bark_gradient: Gradient::from_stops(&[
                (0.0, [0.36, 0.25, 0.17]),
                (1.0, [0.45, 0.33, 0.22]),
            ]),
            ground: GroundSettings::default(),
            decorate: true,
            leaves: LeafCanopySettings::default(),
        }
    }
}

impl GardenSettings {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PlantError::io(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Seed of plant `index`
    pub fn plant_seed(&self, index: u32) -> u64 {
        self.master_seed
            .wrapping_add(SEED_STRIDE.wrapping_mul(u64::from(index) + 1))
    }

    /// X offset of plant `index`, the row centred on the origin
    pub fn plant_offset(&self, index: u32) -> Vec3 {
        let center = (self.plant_count.saturating_sub(1)) as f32 * 0.5;
        Vec3::new((index as f32 - center) * self.x_spacing, 0.0, 0.0)
    }

    /// Settings plant `index` is grown from
    pub fn plant_settings(&self, index: u32) -> PlantSettings {
        PlantSettings {
            seed: self.plant_seed(index),
            branch_orders: self.plant.branch_orders.max(MIN_GARDEN_ORDERS),
            bias: if index % 2 == 0 {
                orthotropic_bias()
            } else {
                plagiotropic_bias()
            },
            ..self.plant.clone()
        }
    }

    fn bark_tint(&self, index: u32) -> Rgb {
        let t = if self.plant_count <= 1 {
            0.0
        } else {
            index as f32 / (self.plant_count - 1) as f32
        };
        self.bark_gradient.evaluate(t)
    }
}

/// One plant and where it stands
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPlant {
    pub offset: Vec3,
    pub plant: Plant,
    pub bark_tint: Rgb,
}

/// Generated garden
#[derive(Debug, Clone, PartialEq)]
pub struct Garden {
    pub settings: GardenSettings,
    pub plants: Vec<PlacedPlant>,
    /// Present when the ground is enabled
    pub ground: Option<MeshData>,
}

impl Garden {
    pub fn generate(settings: &GardenSettings) -> Self {
        let plants: Vec<PlacedPlant> = (0..settings.plant_count)
            .map(|i| {
                let mut plant = build_plant(&settings.plant_settings(i));
                if settings.decorate {
                    plant.decorate(&settings.leaves);
                }
                PlacedPlant {
                    offset: settings.plant_offset(i),
                    plant,
                    bark_tint: settings.bark_tint(i),
                }
            })
            .collect();

        let ground = settings.ground.enabled.then(|| {
            let width = settings.plant_count.saturating_sub(1) as f32 * settings.x_spacing
                + settings.ground.padding;
            build_ground_mesh(&settings.ground, width, width * 0.6)
        });

        info!(
            master_seed = settings.master_seed,
            plants = plants.len(),
            leaves = plants.iter().map(|p| p.plant.leaves.len()).sum::<usize>(),
            ground = ground.is_some(),
            "generated garden"
        );

        Self {
            settings: settings.clone(),
            plants,
            ground,
        }
    }

    /// Replace the whole garden with one grown from `master_seed`
    pub fn regenerate(&mut self, master_seed: u64) {
        let settings = GardenSettings {
            master_seed,
            ..self.settings.clone()
        };
        *self = Self::generate(&settings);
    }
}

/// Write the ground and every plant, in place, as one OBJ file
pub fn write_garden_obj(garden: &Garden, path: &Path) -> Result<()> {
    let objects = with_obj_file(path, |obj| {
        if let Some(ground) = &garden.ground {
            obj.object("ground", ground, None)?;
        }
        for (i, placed) in garden.plants.iter().enumerate() {
            placed.plant.write_objects(
                obj,
                &format!("plant{i}_"),
                placed.offset,
                Some(placed.bark_tint),
            )?;
        }
        Ok(())
    })?;
    debug!(path = %path.display(), objects, "wrote garden obj");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> GardenSettings {
        GardenSettings {
            plant: PlantSettings {
                branch_orders: 2,
                branches_per_order: 3,
                radial_segments: 5,
                curve_samples: 3,
                ..Default::default()
            },
            ground: GroundSettings {
                resolution: 8,
                ..Default::default()
            },
            decorate: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_seeds_and_bias_alternate() {
        let garden = Garden::generate(&small());
        assert_eq!(garden.plants.len(), 3);
        for (i, placed) in garden.plants.iter().enumerate() {
            let s = &placed.plant.settings;
            assert_eq!(s.seed, 42 + 1000 * (i as u64 + 1));
            let bias = if i % 2 == 0 { orthotropic_bias() } else { plagiotropic_bias() };
            assert_eq!(s.bias, bias);
            // Raised to the garden minimum
            assert_eq!(s.branch_orders, 3);
        }
    }

    #[test]
    fn test_row_is_centred() {
        let garden = Garden::generate(&small());
        let xs: Vec<f32> = garden.plants.iter().map(|p| p.offset.x).collect();
        assert_eq!(xs, vec![-8.0, 0.0, 8.0]);
    }

    #[test]
    fn test_bark_tint_spans_gradient() {
        let s = small();
        let garden = Garden::generate(&s);
        assert_eq!(garden.plants[0].bark_tint, [0.36, 0.25, 0.17]);
        assert_eq!(garden.plants[2].bark_tint, [0.45, 0.33, 0.22]);

        let single = GardenSettings { plant_count: 1, ..s };
        assert_eq!(single.bark_tint(0), [0.36, 0.25, 0.17]);
        assert_eq!(single.plant_offset(0), Vec3::ZERO);
    }

    #[test]
    fn test_ground_size() {
        let garden = Garden::generate(&small());
        let ground = garden.ground.as_ref().unwrap();
        assert_eq!(ground.vertex_count(), 9 * 9);
        let max_x = ground.positions.iter().map(|p| p[0]).fold(f32::MIN, f32::max);
        let max_z = ground.positions.iter().map(|p| p[2]).fold(f32::MIN, f32::max);
        // (3 - 1) * 8 + 6 = 22 wide, 13.2 deep
        assert!((max_x - 11.0).abs() < 1e-4);
        assert!((max_z - 6.6).abs() < 1e-4);

        let bare = Garden::generate(&GardenSettings {
            ground: GroundSettings {
                enabled: false,
                ..Default::default()
            },
            ..small()
        });
        assert!(bare.ground.is_none());
    }

    #[test]
    fn test_regenerate() {
        let mut garden = Garden::generate(&small());
        garden.regenerate(7);
        assert_eq!(garden.settings.master_seed, 7);
        assert_eq!(garden.plants[1].plant.settings.seed, 2007);
        assert_eq!(garden, Garden::generate(&GardenSettings { master_seed: 7, ..small() }));
    }

    #[test]
    fn test_toml_defaults_fill_in() {
        let s = GardenSettings::from_toml_str("plant_count = 5\n[plant]\nseed = 1\n").unwrap();
        assert_eq!(s.plant_count, 5);
        assert_eq!(s.x_spacing, 8.0);
        assert_eq!(s.plant.trunk_height, PlantSettings::default().trunk_height);

        let text = GardenSettings::default().to_toml_string().unwrap();
        assert_eq!(GardenSettings::from_toml_str(&text).unwrap(), GardenSettings::default());
    }
}
