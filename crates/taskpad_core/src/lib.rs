pub mod error;
pub mod icon;
pub mod model;
pub mod planner;
pub mod settings;
pub mod storage;
pub mod store;
