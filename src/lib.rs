pub mod catalog;

pub mod common;

pub mod database;

pub mod workloads;
