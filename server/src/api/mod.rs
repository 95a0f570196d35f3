//! API endpoints for the eventreg service.
//!
//! Handlers are grouped by domain:
//! - Events: creating, reading and listing events, seat availability
//! - Registrations: register, cancel, confirm and registrant listings
//! - Sessions: development token issuance

pub mod events;
pub mod registrations;
pub mod sessions;

pub use events::{create_event, get_availability, get_event, list_events};
pub use registrations::{cancel, confirm, list_registrants, my_registrations, register};
pub use sessions::create_session;
