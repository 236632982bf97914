//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep presentation layers decoupled from storage details.

pub mod archive;
pub mod editor;
pub mod reminders;
pub mod trip_service;
