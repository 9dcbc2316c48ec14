pub mod rd_model;
pub mod scene;
pub mod user_event;
