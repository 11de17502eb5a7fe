//! Resumable provisioning of a PVSnesLib (SNES) development environment.
//!
//! A fixed catalog of steps is customized per request, then walked by the
//! orchestrator, which persists progress after every step so an interrupted
//! or failed run resumes where it stopped.
pub mod catalog;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod customize;
pub mod executor;
pub mod orchestrator;
pub mod provision;
pub mod report;
pub mod templates;
pub mod workflow;
