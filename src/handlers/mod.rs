pub mod health;
pub mod home;
pub mod predict;

pub use health::{health_handler, ready_handler};
pub use home::home_handler;
pub use predict::{predict_handler, PredictionRequest, PredictionResponse};
