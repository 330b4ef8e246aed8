pub mod auth;
pub mod category_tree;
pub mod search;
pub mod settings;
pub mod stats;
pub mod store;
pub mod utils;

pub use auth::{AppUser, AuthClient, AuthError, Session};
pub use category_tree::{build_tree, can_reparent, descendants_of, max_depth, path_of, CategoryNode};
pub use store::{Bookmark, Category, StoreClient, StoreError};
