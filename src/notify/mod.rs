// src/notify/mod.rs

//! Outbound notification collaborators.
//!
//! The outbound notifier is fire-and-forget: a delivery failure is logged
//! and never propagated to the pipeline. The bulk SMS extension lives in
//! [`sms`].

pub mod sms;

use crate::error::Result;

pub use sms::{HttpSmsGateway, SmsGateway, SmsParams};

/// A fire-and-forget notification sink.
pub trait Notifier: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Deliver a titled message.
    fn notify(&self, title: &str, message: &str) -> Result<()>;
}

/// Notifier that prints to the console, standing in for a desktop toast.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn name(&self) -> &'static str {
        "console"
    }

    fn notify(&self, title: &str, message: &str) -> Result<()> {
        println!("{title} - {message}");
        Ok(())
    }
}

/// Deliver a notification, swallowing and logging any failure.
pub fn notify_best_effort(notifier: &dyn Notifier, title: &str, message: &str) {
    if let Err(e) = notifier.notify(title, message) {
        log::warn!("Notifier {} failed: {}", notifier.name(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn notify(&self, _title: &str, _message: &str) -> Result<()> {
            Err(AppError::config("notifier backend missing"))
        }
    }

    #[test]
    fn test_console_notifier_never_fails() {
        assert!(ConsoleNotifier.notify("title", "message").is_ok());
    }

    #[test]
    fn test_best_effort_swallows_failures() {
        // Must not panic or propagate.
        notify_best_effort(&FailingNotifier, "title", "message");
    }
}
