mod client;
mod record;

pub use client::ScryfallClient;
pub use record::ScryfallCard;
