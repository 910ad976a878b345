//! Taiga REST API access

pub mod client;
pub mod error;
pub mod models;

pub use client::{ProjectRef, TaigaClient};
pub use error::TaigaError;
pub use models::{NewTask, NewUserStory, TaigaMilestone, TaigaProject, TaigaTask, TaigaUserStory};
