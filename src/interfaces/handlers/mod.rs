pub mod assets;
pub mod dashboard;
pub mod generation;
pub mod home;
pub mod json_error;
pub mod pricing;
pub mod system;
pub mod users;
