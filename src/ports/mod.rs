//! Ports - trait seams between the application and its adapters.

mod token_verifier;

pub use token_verifier::TokenVerifier;
