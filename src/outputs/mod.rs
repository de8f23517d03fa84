//! Rendering of summarized articles for delivery.
//!
//! # Submodules
//!
//! - [`digest`]: plain-text digest used as the email body and by the `digest` command
//! - [`html`]: HTML fragments streamed by the interactive web surface
//!
//! Both are pure: the same entries (and date, for the digest) always render
//! the same output.

pub mod digest;
pub mod html;
