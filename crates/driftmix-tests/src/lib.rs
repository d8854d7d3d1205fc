//! Integration test crate for Driftmix.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on multiple driftmix crates to verify they work together.

#[cfg(test)]
mod support;

#[cfg(test)]
mod engine;

#[cfg(test)]
mod timer;

#[cfg(test)]
mod lifecycle;

#[cfg(test)]
mod store;

#[cfg(test)]
mod mixer;
