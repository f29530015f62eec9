/*!
Typed simulation configuration.

Every recognised option lives in [`SimConfig`]. Files are JSON; any field may be
omitted and falls back to the defaults below, which reproduce the historical
parameter set of the pusher scene. A configuration is validated once, right
after loading, and treated as read-only afterwards.

Units
- `scale` is the global length-scale factor `S`.
- Geometry and the collision margin are given in real meters and kilograms and
  are converted with [`UnitScale`] during scene assembly.
- Per-tick pusher steps are already in simulation units.
- Gravity is in m/s² and is never rescaled.
*/

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    BASE_LENGTH_M, BASE_MASS_KG, DEFAULT_SCALE, DEPTH_SPEED_MPS, DEPTH_STEP, FIXED_STEP_S,
    FRAME_SLEEP, GRAVITY_MPS2, LATERAL_SPEED_MPS, LATERAL_STEP, LAYOUT_SPACING, MAX_SUBSTEPS,
    PIECE_HEIGHT_M,
};
use crate::inertia::InertiaModel;
use crate::solver_mode::{DEFAULT_SOLVER_FLAGS, SolverMode, SolverModeFlag};
use crate::units::UnitScale;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Surface response of one collision partner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub friction: f32,
    pub restitution: f32,
}

impl Material {
    pub const fn new(friction: f32, restitution: f32) -> Self {
        Self {
            friction,
            restitution,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Materials {
    pub ground: Material,
    pub pusher: Material,
    pub polygon: Material,
}

impl Default for Materials {
    fn default() -> Self {
        Self {
            ground: Material::new(0.5, 0.0),
            pusher: Material::new(0.3, 0.0),
            polygon: Material::new(0.4, 0.0),
        }
    }
}

/// Global damping applied to every dynamic body. Dimensionless ratios.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Damping {
    pub linear: f32,
    pub angular: f32,
}

impl Default for Damping {
    fn default() -> Self {
        Self {
            linear: 0.1,
            angular: 0.1,
        }
    }
}

/// Real-world dimensions of the puzzle before scaling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub base_length_m: f32,
    pub height_m: f32,
    pub base_mass_kg: f32,
    /// Gap between pieces in the initial layout, as a fraction of the base length.
    pub spacing: f32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            base_length_m: BASE_LENGTH_M,
            height_m: PIECE_HEIGHT_M,
            base_mass_kg: BASE_MASS_KG,
            spacing: LAYOUT_SPACING,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub iterations: u32,
    pub solver_mode: Vec<SolverModeFlag>,
    pub split_impulse: bool,
    /// Error reduction parameter.
    pub erp: f32,
    /// Constraint force mixing.
    #[serde(alias = "tau")]
    pub cfm: f32,
    pub gravity: [f32; 3],
    /// Size of one internal step (seconds).
    pub fixed_step: f32,
    /// Upper bound of internal steps per frame.
    pub max_substeps: u32,
    /// Pause after each frame (milliseconds).
    pub frame_sleep_ms: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            solver_mode: DEFAULT_SOLVER_FLAGS.to_vec(),
            split_impulse: true,
            erp: 0.2,
            cfm: 0.0,
            gravity: [0.0, -GRAVITY_MPS2, 0.0],
            fixed_step: FIXED_STEP_S,
            max_substeps: MAX_SUBSTEPS,
            frame_sleep_ms: FRAME_SLEEP.as_millis() as u64,
        }
    }
}

impl SolverConfig {
    pub fn solver_mode(&self) -> SolverMode {
        SolverMode::from_flags(&self.solver_mode)
    }
}

/// How the pusher displacement of one tick is derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushStepping {
    /// Constant displacement per tick, independent of frame time.
    #[default]
    PerTick,
    /// Displacement = speed * elapsed frame time.
    Velocity,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub stepping: PushStepping,
    /// Lateral displacement per tick (simulation units).
    pub lateral_step: f32,
    /// Depth displacement per tick (simulation units).
    pub depth_step: f32,
    /// Lateral speed for velocity stepping (m/s, unscaled).
    pub lateral_speed_mps: f32,
    /// Depth speed for velocity stepping (m/s, unscaled).
    pub depth_speed_mps: f32,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            stepping: PushStepping::PerTick,
            lateral_step: LATERAL_STEP,
            depth_step: DEPTH_STEP,
            lateral_speed_mps: LATERAL_SPEED_MPS,
            depth_speed_mps: DEPTH_SPEED_MPS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub scale: f32,
    /// Collision margin in meters (unscaled).
    pub collision_margin_m: f32,
    /// `false`: box-approximated inertia. `true`: the engine's exact inertia.
    pub use_custom_inertia: bool,
    pub geometry: Geometry,
    pub materials: Materials,
    pub damping: Damping,
    pub solver: SolverConfig,
    pub actuator: ActuatorConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            collision_margin_m: 0.002,
            use_custom_inertia: false,
            geometry: Geometry::default(),
            materials: Materials::default(),
            damping: Damping::default(),
            solver: SolverConfig::default(),
            actuator: ActuatorConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn units(&self) -> UnitScale {
        UnitScale::new(self.scale)
    }

    pub fn inertia_model(&self) -> InertiaModel {
        InertiaModel::from_custom_flag(self.use_custom_inertia)
    }

    /// Collision margin in simulation units.
    pub fn collision_margin(&self) -> f32 {
        self.units().length(self.collision_margin_m)
    }

    /// Check every option once. Values that pass are trusted by the rest of
    /// the crate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("scale", self.scale)?;
        positive("geometry.base_length_m", self.geometry.base_length_m)?;
        positive("geometry.height_m", self.geometry.height_m)?;
        positive("geometry.base_mass_kg", self.geometry.base_mass_kg)?;
        non_negative("geometry.spacing", self.geometry.spacing)?;

        non_negative("collision_margin_m", self.collision_margin_m)?;
        if self.collision_margin_m * 2.0 >= self.geometry.height_m {
            return Err(ConfigError::invalid(
                "collision_margin_m",
                format!(
                    "{} m leaves no core shape inside a {} m thick piece",
                    self.collision_margin_m, self.geometry.height_m
                ),
            ));
        }

        for (field, material) in [
            ("materials.ground", self.materials.ground),
            ("materials.pusher", self.materials.pusher),
            ("materials.polygon", self.materials.polygon),
        ] {
            non_negative(field, material.friction)?;
            if !(0.0..=1.0).contains(&material.restitution) {
                return Err(ConfigError::invalid(
                    field,
                    format!("restitution {} outside [0, 1]", material.restitution),
                ));
            }
        }

        non_negative("damping.linear", self.damping.linear)?;
        non_negative("damping.angular", self.damping.angular)?;

        let solver = &self.solver;
        if solver.iterations == 0 {
            return Err(ConfigError::invalid("solver.iterations", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&solver.erp) {
            return Err(ConfigError::invalid(
                "solver.erp",
                format!("{} outside [0, 1]", solver.erp),
            ));
        }
        non_negative("solver.cfm", solver.cfm)?;
        if solver.gravity.iter().any(|g| !g.is_finite()) {
            return Err(ConfigError::invalid("solver.gravity", "must be finite"));
        }
        positive("solver.fixed_step", solver.fixed_step)?;
        if solver.max_substeps == 0 {
            return Err(ConfigError::invalid("solver.max_substeps", "must be at least 1"));
        }

        non_negative("actuator.lateral_step", self.actuator.lateral_step)?;
        non_negative("actuator.depth_step", self.actuator.depth_step)?;
        non_negative("actuator.lateral_speed_mps", self.actuator.lateral_speed_mps)?;
        non_negative("actuator.depth_speed_mps", self.actuator.depth_speed_mps)?;

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} must be > 0")))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, format!("{value} must be >= 0")))
    }
}
