// Domain layer: trade records, derived report tables and the ports the
// pipeline is written against.

pub mod model;
pub mod ports;
pub mod report;
