pub mod binning_strategy;
pub mod breakpoints;
pub mod config;
pub mod error;
pub mod linear_model;
pub mod sparse;
pub mod word;
