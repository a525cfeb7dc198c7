//! Course-wide constants for the traversal workspace.
//!
//! Single source of truth for tolerances and course geometry.
//! The tolerances are fixed: they are not part of any configuration file.

/// Maximum heading deviation [degrees] still considered "on heading".
pub const ANGLE_TOLERANCE: f64 = 0.05;

/// Maximum forward-distance deviation [tile units] still considered "at the turn point".
pub const DISTANCE_TOLERANCE: f64 = 0.25;

/// Heading change of one course turn [degrees].
pub const DEGREES_PER_TURN: u32 = 90;

/// Turn count at which the course is complete (center tile reached).
pub const TERMINAL_TURN_COUNT: u32 = 10;

/// Decimal places kept when the simulated course snaps distance readings.
pub const SNAP_DECIMALS: i32 = 2;

/// Turn indices (0-based) after which the lateral wall is one tile further away.
pub const LATERAL_STEP_TURNS: [u32; 2] = [3, 7];

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/traverse.toml";
