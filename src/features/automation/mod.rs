//! Automation entities stored alongside tickets. The ticket service never reads them.

pub mod models;
