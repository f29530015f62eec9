use std::time::Duration;

/// Global length-scale factor `S` between the real puzzle and the simulation.
pub const DEFAULT_SCALE: f32 = 5.0;

/// Leg of the small triangle and edge of the square, in meters (unscaled).
pub const BASE_LENGTH_M: f32 = 0.1;

/// Thickness of every puzzle piece, in meters (unscaled).
pub const PIECE_HEIGHT_M: f32 = 0.018;

/// Mass of the smallest piece in kilograms (unscaled). Larger pieces use
/// integer multiples of it.
pub const BASE_MASS_KG: f32 = 0.180;

/// Gap left between neighbouring pieces in the initial layout, as a fraction
/// of the base length.
pub const LAYOUT_SPACING: f32 = 1.0 / 20.0;

/// Fixed size of one internal solver step (seconds). 20 Hz physics.
pub const FIXED_STEP_S: f32 = 1.0 / 20.0;

/// Upper bound of internal sub-steps per rendered frame.
pub const MAX_SUBSTEPS: u32 = 1000;

/// Pause after each displayed frame, bounding CPU usage.
pub const FRAME_SLEEP: Duration = Duration::from_millis(10);

/// Lateral pusher displacement per tick, in simulation units.
pub const LATERAL_STEP: f32 = 2.0;

/// Insertion-depth pusher displacement per tick, in simulation units.
pub const DEPTH_STEP: f32 = 0.01;

/// Lateral pusher speed used by velocity-based stepping (m/s, unscaled).
pub const LATERAL_SPEED_MPS: f32 = 0.5;

/// Depth pusher speed used by velocity-based stepping (m/s, unscaled).
pub const DEPTH_SPEED_MPS: f32 = 0.05;

/// Standard gravity. Not rescaled with the scene, see `units`.
pub const GRAVITY_MPS2: f32 = 9.81;
