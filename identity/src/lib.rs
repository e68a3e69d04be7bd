pub mod claims;
pub mod firebase;
pub mod provider;
