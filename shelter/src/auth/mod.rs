//! Bearer-token authentication.
//!
//! Accounts are a static set loaded from configuration. A client logs in with
//! `POST /token` (form-encoded `username` and `password`) and receives a short-lived
//! HS256 JWT. Protected routes take a [`CurrentUser`](current_user::CurrentUser)
//! extractor, which reads the `Authorization: Bearer <token>` header, verifies the
//! token and resolves its subject to an active account.
//!
//! # Modules
//!
//! - [`credentials`]: the account store and password checks
//! - [`current_user`]: the extractor guarding write routes
//! - [`password`]: Argon2 hashing and verification
//! - [`session`]: token minting and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use shelter::auth::current_user::CurrentUser;
//!
//! async fn protected_handler(user: CurrentUser) -> String {
//!     format!("Hello, {}!", user.username())
//! }
//! ```

pub mod credentials;
pub mod current_user;
pub mod password;
pub mod session;
