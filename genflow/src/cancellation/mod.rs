//! Cooperative cancellation shared by a whole job.

mod token;

pub use token::CancellationToken;
