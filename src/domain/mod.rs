// Race session domain (rounds, qualifying, laps)
pub mod session;

// Fastest-lap telemetry domain
pub mod telemetry;

// Datasets and metrics
pub mod ml;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
