//! Email adapter - Resend HTTP mailer.

mod resend_mailer;

pub use resend_mailer::ResendMailer;
