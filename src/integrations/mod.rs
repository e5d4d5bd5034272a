//! External service integrations.

pub mod search_client {
    pub use crate::search_client::*;
}
