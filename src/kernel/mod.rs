pub mod coordinator;
pub mod engine;
pub mod gate;
pub mod reactor;
pub mod scheduler;
pub mod signal;
pub mod suggestion;
pub mod surface;
pub mod telemetry;
pub mod time;
