/// Recovery error types.
pub mod errors;
