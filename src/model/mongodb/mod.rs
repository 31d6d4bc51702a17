mod collection;
mod errors;
mod vote_list;

pub use collection::{Coll, MongoCollection};
pub use errors::is_duplicate_key_error;
pub use vote_list::serde_vote_list;
