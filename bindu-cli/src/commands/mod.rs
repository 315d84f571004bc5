pub mod capture;
pub mod launch;
pub mod provision;
