//! # Confide
//!
//! `confide` is a small authenticated web application. Visitors register with a
//! username and password or sign in with Google, and authenticated users may
//! post a short text secret. All posted secrets are shown together on a shared
//! page with no indication of who posted what.
//!
//! ## Authentication
//!
//! Local credentials are stored as salted Argon2id hashes; verification is
//! constant-time and pays the hashing cost even for unknown usernames so
//! response timing does not reveal whether an account exists.
//!
//! Sessions are opaque random tokens handed to the browser in an `HttpOnly`
//! cookie and resolved against a server-side table. Nothing about the user is
//! ever derived from client-supplied values other than the token.
//!
//! ## Storage
//!
//! User records live behind the [`confide::store::UserStore`] trait. The
//! Postgres engine is the production backend; an in-memory engine backs
//! `--dsn`-less dev runs and the test suite.

pub mod cli;
pub mod confide;

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
