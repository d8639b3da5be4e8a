//! Synthetic persona model and biography generation.
//!
//! A company is populated from demographic parameters: one CEO, a set of
//! executives and assistants, and one specialist per requested specialty.
//! Names are allocated through a per-company uniqueness registry, and every
//! persona gets a rendered markdown biography that the downstream pipeline
//! stages parse.

mod generator;
mod names;
mod types;

pub use generator::{BiographyGenerator, CompanySetup};
pub use names::{AllocatedName, NameRegistry};
pub use types::{
    sanitize_name, Category, CompanyProfile, Gender, Nationality, PersonaRecord, PersonasConfig,
    Specialty,
};
