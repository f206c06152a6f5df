//! # Sealbox Testkit
//!
//! Testing utilities for Sealbox.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a temp storage root, a memory store seeded with the
//!   standard roles, and staged source files for each protector branch
//! - **Generators**: proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! Quickly set up test scenarios:
//!
//! ```rust,ignore
//! use sealbox_testkit::fixtures::{uploader_role_id, TestFixture};
//!
//! let fixture = TestFixture::new().await;
//! let source = fixture.write_source("notes.txt", b"hello");
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sealbox_testkit::generators::{artifact, password};
//!
//! proptest! {
//!     #[test]
//!     fn credential_gate_is_exact(art in artifact(), supplied in password()) {
//!         let expected = art.credential.expose() == supplied;
//!         prop_assert_eq!(art.credential_matches(&supplied), expected);
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{
    admin_role_id, reader_role_id, standard_roles, uploader_role_id, write_minimal_pdf,
    TestFixture,
};
