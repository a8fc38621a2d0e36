//! # fedwatch-session
//!
//! Session lifecycle for fedwatch: identity operations plus a live,
//! subscribable view of who is signed in.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use fedwatch_session::{MemoryIdentityProvider, SessionManager, SignUpRequest};
//!
//! #[tokio::main]
//! async fn main() -> fedwatch_types::Result<()> {
//!     // One manager for the whole application; clone it into consumers
//!     let manager = SessionManager::new(Arc::new(MemoryIdentityProvider::new()));
//!     let listener = manager.listen();
//!
//!     let _subscription = manager.subscribe(|state| {
//!         println!("session is now {:?}", state);
//!     });
//!
//!     let request = SignUpRequest::new("doc@hospital.org", "secret1")
//!         .with_display_name("Dr. Ada");
//!     manager.sign_up(&request).await?;
//!     manager.deauthenticate().await?;
//!
//!     listener.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Explicit injection**: no global session; pass the manager around
//! - **Distinct unresolved state**: "not known yet" is never "signed out"
//! - **RAII subscriptions**: drop the guard to stop notifications
//! - **Pluggable providers**: in-memory, or Firebase Identity Toolkit (`firebase` feature)

mod manager;
mod memory;
mod provider;
mod state;
mod subscription;
mod validation;

#[cfg(feature = "firebase")]
pub mod firebase;

pub use manager::{ListenerHandle, SessionManager};
pub use memory::MemoryIdentityProvider;
pub use provider::{IdentityProvider, CHANGE_CHANNEL_CAPACITY};
pub use subscription::Subscription;
pub use validation::{SignUpRequest, MIN_PASSWORD_LEN};

#[cfg(feature = "firebase")]
pub use firebase::{
    FirebaseIdentityProvider, FirebaseIdentityProviderBuilder, DEFAULT_IDENTITY_BASE_URL,
};

// Re-export types for convenience
pub use fedwatch_types::{Error, ErrorKind, Result, Session, SessionState};
