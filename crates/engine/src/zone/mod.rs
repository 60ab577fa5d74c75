mod arbitration;
mod placement;

pub use arbitration::ArbitrationCoordinator;
pub use placement::{PlacementZone, ZoneClaim, ZoneId};
