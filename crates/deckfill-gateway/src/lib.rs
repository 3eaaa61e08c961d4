//! # deckfill-gateway
//!
//! HTTP gateway for deckfill: implements [`deckfill_core::Gateway`] over the
//! Google Slides and Drive REST APIs with a blocking `reqwest` client.
//!
//! ## Example
//!
//! ```no_run
//! use deckfill_core::Engine;
//! use deckfill_gateway::{presentation_url, RetryPolicy, SlidesClient};
//! use serde_json::json;
//!
//! let client = SlidesClient::new()?
//!     .with_token(std::env::var("DECKFILL_ACCESS_TOKEN")?)
//!     .with_retry(RetryPolicy::default());
//!
//! let data = json!({"company_name": "Acme", "employees": [{"name": "Ada"}]});
//! let outcome = Engine::new(&client).populate("TEMPLATE_ID", "Team", &data, None)?;
//! println!("{}", presentation_url(&outcome.document_id));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod client;
pub mod error;
pub mod retry;
pub mod wire;

pub use client::{presentation_url, SlidesClient, DEFAULT_DRIVE_URL, DEFAULT_SLIDES_URL, DEFAULT_TIMEOUT};
pub use error::{error_for_status, ClientError, Result};
pub use retry::RetryPolicy;
pub use wire::decode;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
