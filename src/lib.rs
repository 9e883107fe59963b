//! Tailorplane - LLM invocation control plane for resume tailoring
//!
//! This library provides the decision layer that sits between a resume-tailoring
//! backend and its model providers: routing resolution (which model serves a
//! (role, scenario) pair), budget enforcement (multi-tier spend limits checked
//! before any network call), structured-output generation with validation-driven
//! retries, and reproducible resume/vacancy match scoring with a deterministic
//! fallback path.

pub mod budget;
pub mod catalog;
pub mod config;
pub mod control;
pub mod invocation;
pub mod logging;
pub mod provider;
pub mod routing;
pub mod scoring;
pub mod store;
