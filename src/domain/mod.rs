// Domain layer: burst models and ports (interfaces).

pub mod model;
pub mod ports;
