pub mod catalog;
pub mod groups;
pub mod health;
pub mod programs;
