// Gameplay tuning for the arena space and shared physics constants.
// These values are mirrored by clients for local prediction, so changing
// any of them is a protocol-visible change.

#[derive(Debug, Clone, Copy)]
pub struct ArenaTuning {
    /// Arena width in pixels.
    pub width: f32,

    /// Arena height in pixels.
    pub height: f32,

    /// Y coordinate of the ground plane fighters stand on.
    pub ground_y: f32,

    /// Downward acceleration in pixels per second squared.
    pub gravity: f32,

    /// Horizontal velocity decay factor applied per tick while grounded.
    pub friction: f32,

    /// Horizontal speeds below this snap to zero.
    pub friction_epsilon: f32,

    /// Fighter bounding box width in pixels.
    pub fighter_width: f32,

    /// Fighter bounding box height in pixels.
    pub fighter_height: f32,
}

impl Default for ArenaTuning {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            ground_y: 520.0,
            gravity: 2000.0,
            friction: 0.85,
            friction_epsilon: 1.0,
            fighter_width: 40.0,
            fighter_height: 80.0,
        }
    }
}
