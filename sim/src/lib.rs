pub mod actuator;
pub mod body;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod inertia;
pub mod input;
pub mod scene;
pub mod scheduler;
pub mod shapes;
pub mod solver_mode;
pub mod units;
pub mod world;

// Re-export rapier so the binary can name engine types without its own dependency.
pub use rapier3d;

pub use actuator::{DirectionalIntent, KinematicActuator};
pub use body::{BodyKind, MotionState, RigidBodyFactory, yaw_transform};
pub use config::{
    ActuatorConfig, ConfigError, Damping, Geometry, Material, Materials, PushStepping, SimConfig,
    SolverConfig,
};
pub use diagnostics::{DiagnosticSampler, PusherSample};
pub use error::SceneError;
pub use inertia::{InertiaModel, InertiaTensorResolver, box_inertia};
pub use input::{KeyEvent, KeyState, PushKey, UnknownKey};
pub use scene::{Piece, PieceDescriptor, Scene, SceneDimensions};
pub use scheduler::{FrameClock, StepPlan, SubstepScheduler};
pub use shapes::{PieceKind, ShapeCatalog, ShapeTemplate};
pub use solver_mode::{SolverMode, SolverModeFlag};
pub use units::{Dimension, UnitScale};
pub use world::{BodyId, PhysicsWorld, StepReport, TickObserver};
