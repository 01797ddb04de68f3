// src/models/mod.rs

pub mod attempt;
pub mod paper;
pub mod question;
pub mod violation;
