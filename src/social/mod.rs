mod client;
pub mod models;

pub use client::{HttpSocialClient, SocialClient, SocialError};
pub use models::{Post, PostQuery, UserProfile};

#[cfg(test)]
pub mod testing;
