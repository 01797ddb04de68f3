// src/exam/mod.rs

pub mod answers;
pub mod assignment;
pub mod countdown;
pub mod gate;
pub mod platform;
pub mod proctor;
pub mod report;
pub mod runner;
pub mod timer;
