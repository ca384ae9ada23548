pub mod handlers;
pub mod models;
pub mod money;
pub mod pages;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod mod_tests;
