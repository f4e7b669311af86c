//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the external HTTP layer decoupled from storage details.

pub mod distribution_service;
pub mod operator_service;
pub mod source_service;
