//! Typed client for the clinic booking API.
//!
//! Fetches raw schedule rows, projects them locally, pre-checks bookings before
//! they are sent and keeps the bearer credential in a [`CredentialStore`]
//! chosen at construction time.

pub mod client;
pub mod credentials;
pub mod error;

pub use client::{BookingClient, BookingDraft, DoctorEntry, RegisterForm};
pub use credentials::{
    credential_store, Credential, CredentialPersistence, CredentialStore, EphemeralCredentialStore,
    FileCredentialStore, SessionCredentialStore,
};
pub use error::ClientError;
