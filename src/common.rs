pub mod error;

pub mod statistics;

pub mod utils;
