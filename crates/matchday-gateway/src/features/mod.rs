pub mod assignment;
pub mod compute_control;
pub mod observability;
pub mod remote_exec;
pub mod state_store;
