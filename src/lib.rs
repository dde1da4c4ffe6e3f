//! Steel Wheel Auto invoicing: turns a vehicle sale into a one-page PDF
//! invoice, stores it and emails it to the customer and the office.

pub mod assets;
pub mod auth;
pub mod config;
pub mod email;
pub mod error;
pub mod layout;
pub mod metrics;
pub mod models;
pub mod pdf;
pub mod routes;
pub mod store;
pub mod words;

pub use models::{InvoiceRecord, ValidationError};
pub use pdf::{InvoiceRenderer, RenderError, RenderedDocument};
