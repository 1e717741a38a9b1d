//! Alarm relay: request payload and mail delivery.

pub mod mailer;
pub mod params;

pub use mailer::{AlarmMail, MailError, Mailer, SmtpMailer};
pub use params::AlarmParams;
