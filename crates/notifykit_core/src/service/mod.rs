//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls and the recipient engine into use-case APIs.
//! - Keep mailer/dispatch callers decoupled from storage details.

pub mod notification_setting_service;
pub mod recipient_service;
