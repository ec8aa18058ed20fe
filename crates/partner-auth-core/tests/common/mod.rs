//! Common test utilities for partner-auth-core integration tests

pub mod jwks_mock;
pub mod mock_repos;

#[allow(unused_imports)]
pub use jwks_mock::{JwksMockServer, TestFirebaseClaims, TestKeyPair};
#[allow(unused_imports)]
pub use mock_repos::{FlakyRefreshTokenRepository, RecordingUserRepository};
