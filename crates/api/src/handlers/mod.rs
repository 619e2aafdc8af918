pub mod analysis;
pub mod compare;
pub mod monitoring;
pub mod parallel;
pub mod patterns;
pub mod sources;
pub mod visualization;
