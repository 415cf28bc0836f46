//! Run notification delivery

pub mod mailer;

pub use mailer::RelayMailer;
