pub mod collection;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod resolve;
pub mod services;
