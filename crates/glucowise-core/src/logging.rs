// ABOUTME: Component logging handle passed explicitly into every service and engine constructor
// ABOUTME: Wraps a tracing span so structured events carry the owning component without global state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # Injected Logging
//!
//! Components never reach for a process-wide logger object. Each constructor takes an
//! [`AppLogger`], and every event it emits is parented to the logger's span, so the
//! owning component shows up in structured output (`component.name`). The tracing
//! subscriber itself is installed once by the binary.

use tracing::{debug, info, info_span, warn, Span};

/// Structured logging handle bound to one component
#[derive(Debug, Clone)]
pub struct AppLogger {
    component: &'static str,
    span: Span,
}

impl AppLogger {
    /// Create a logger for a top-level component
    #[must_use]
    pub fn new(component: &'static str) -> Self {
        Self {
            component,
            span: info_span!("component", component.name = component),
        }
    }

    /// Create a logger for a sub-component nested under this one
    #[must_use]
    pub fn child(&self, component: &'static str) -> Self {
        Self {
            component,
            span: info_span!(parent: &self.span, "component", component.name = component),
        }
    }

    /// Name of the component this logger belongs to
    #[must_use]
    pub const fn component(&self) -> &'static str {
        self.component
    }

    /// Span that parents every event from this logger
    #[must_use]
    pub const fn span(&self) -> &Span {
        &self.span
    }

    /// Log a free-form informational event
    pub fn info(&self, message: &str) {
        info!(parent: &self.span, "{message}");
    }

    /// Log a free-form debug event
    pub fn debug(&self, message: &str) {
        debug!(parent: &self.span, "{message}");
    }

    /// Log a free-form warning
    pub fn warn(&self, message: &str) {
        warn!(parent: &self.span, "{message}");
    }

    /// Log user authentication events
    pub fn log_auth_event(&self, user_id: &str, event: &str, success: bool) {
        info!(
            parent: &self.span,
            user.id = %user_id,
            auth.event = %event,
            auth.success = %success,
            "Authentication event"
        );
    }

    /// Log document store operations
    pub fn log_store_operation(
        &self,
        operation: &str,
        collection: &str,
        success: bool,
        duration_ms: u64,
    ) {
        debug!(
            parent: &self.span,
            store.operation = %operation,
            store.collection = %collection,
            store.success = %success,
            store.duration_ms = %duration_ms,
            "Document store operation"
        );
    }

    /// Log calls to hosted services (LLM, vision, identity)
    pub fn log_external_call(&self, service: &str, operation: &str, success: bool, duration_ms: u64) {
        if success {
            info!(
                parent: &self.span,
                external.service = %service,
                external.operation = %operation,
                external.duration_ms = %duration_ms,
                "External call completed"
            );
        } else {
            warn!(
                parent: &self.span,
                external.service = %service,
                external.operation = %operation,
                external.duration_ms = %duration_ms,
                "External call failed"
            );
        }
    }

    /// Log a completed health computation for a user
    pub fn log_computation(&self, computation: &str, user_id: &str) {
        info!(
            parent: &self.span,
            user.id = %user_id,
            computation = %computation,
            "Health computation completed"
        );
    }
}
