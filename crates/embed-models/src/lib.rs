#![deny(missing_docs)]

//! # Tableau Embed Models
//!
//! Wire types exchanged between an embedding front-end, the sign-in relay
//! and the Tableau REST sign-in endpoint.
//!
//! ```text
//! SignInRequest                     (front-end → relay)
//! └── RawCredentials ──into_sign_in──▶ TableauSignIn   (relay → Tableau)
//!                                      └── CredentialPair + Site
//! TokenResponse                     (relay → front-end)
//! ```
//!
//! ## Module layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`credentials`] | `CredentialKind`, `SiteContentUrl`, inbound `RawCredentials` |
//! | [`signin`] | `SignInRequest`, outbound `TableauSignIn`, `TokenResponse` |
//! | [`error`] | `ModelError` |

pub mod credentials;
pub mod error;
pub mod signin;

pub use credentials::*;
pub use error::*;
pub use signin::*;
