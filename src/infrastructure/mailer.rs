use crate::config::MailConfig;
use crate::services::mailer::{Mailer, create_mailer};
use std::sync::Arc;
use tracing::info;

pub fn setup_mailer(config: &MailConfig) -> Arc<dyn Mailer> {
    info!(
        "📧 Mail: backend={}, from={}, to={}",
        config.backend,
        config.from,
        config.to.join(", ")
    );

    if config.backend.eq_ignore_ascii_case("memory") {
        tracing::warn!("⚠️  Memory mail backend selected, notifications are not delivered");
    }
    if config.fail_silently {
        tracing::warn!("⚠️  MAIL_FAIL_SILENTLY is set, failed notifications only get logged");
    }

    create_mailer(config)
}
