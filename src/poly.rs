//! Polynomial structures: dense univariate polynomials over a generic ring
//! and the sparse differential polynomials used by the reduction pipeline.

pub mod diffpoly;
pub mod univariate;
