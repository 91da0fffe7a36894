//! BDD step definitions for the EduVerse dashboard

pub mod demo_steps;
pub mod startup_steps;
