//! Route handlers

pub mod pages;
pub mod predict;
pub mod status;
