//! Bot-side error plumbing.
//!
//! Every handler returns [`HandlerResult`]; anything that bubbles out of a handler lands in
//! [`ReportingErrorHandler`], which logs it and forwards a (truncated) report to the admin chat.
use std::sync::Arc;

use futures::future::BoxFuture;
use kofe_engine::traits::{AdminApiError, CustomerApiError, OrderFlowError};
use log::*;
use teloxide::{
    dispatching::dialogue::{Dialogue, InMemStorage, InMemStorageError},
    error_handlers::ErrorHandler,
};
use thiserror::Error;

use crate::{epay::EpayError, notifier::TelegramNotifier, state::DialogueState};

/// Telegram rejects messages longer than this.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

pub type HandlerResult = Result<(), BotError>;
pub type BotDialogue = Dialogue<DialogueState, InMemStorage<DialogueState>>;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),
    #[error("Dialogue storage error: {0}")]
    Storage(#[from] InMemStorageError),
    #[error("Order flow error: {0}")]
    OrderFlow(#[from] OrderFlowError),
    #[error("Customer database error: {0}")]
    Customer(#[from] CustomerApiError),
    #[error("Admin database error: {0}")]
    Admin(#[from] AdminApiError),
    #[error("Payment gateway error: {0}")]
    Epay(#[from] EpayError),
    #[error("Report error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Cuts an error report down to fit into a single Telegram message.
pub fn truncate_report(text: &str) -> String {
    if text.chars().count() <= TELEGRAM_MESSAGE_LIMIT {
        return text.to_string();
    }
    let head = text.chars().take(4000).collect::<String>();
    format!("{head}...\n\n(сообщение урезано)")
}

/// The dispatcher-level error handler. Logs the error and pushes the report to the admin via the
/// notifier, so a broken handler is noticed without watching the server logs.
pub struct ReportingErrorHandler {
    notifier: TelegramNotifier,
}

impl ReportingErrorHandler {
    pub fn new(notifier: TelegramNotifier) -> Arc<Self> {
        Arc::new(Self { notifier })
    }
}

impl ErrorHandler<BotError> for ReportingErrorHandler {
    fn handle_error(self: Arc<Self>, error: BotError) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            error!("🤖️ Unhandled error in a bot handler: {error}");
            let report = truncate_report(&format!("❗️❗️❗️ Произошла необработанная ошибка!\n\n{error}"));
            self.notifier.report_error(&report).await;
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn short_reports_pass_through_unchanged() {
        let text = "Всё сломалось";
        assert_eq!(truncate_report(text), text);
    }

    #[test]
    fn long_reports_are_cut_to_fit() {
        let text = "б".repeat(5000);
        let report = truncate_report(&text);
        assert!(report.chars().count() <= TELEGRAM_MESSAGE_LIMIT);
        assert!(report.ends_with("...\n\n(сообщение урезано)"));
        assert!(report.starts_with("бббб"));
    }
}
