pub mod audio;
pub mod config;
pub mod elements;
pub mod generate;
pub mod health;
pub mod keys;
pub mod models;
