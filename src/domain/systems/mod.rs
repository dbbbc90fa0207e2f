// Domain systems: pure rules invoked by the authoritative room.

pub mod combat;
pub mod physics;
