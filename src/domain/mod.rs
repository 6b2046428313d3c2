pub mod entities;
pub mod pricing;
pub mod use_cases;
