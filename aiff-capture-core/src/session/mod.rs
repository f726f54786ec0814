pub mod capture_loop;
pub mod coordinator;
pub mod recorder;
