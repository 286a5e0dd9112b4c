//! UI layer for the activities desktop GUI.

pub mod app;

pub use app::ActivitiesApp;
