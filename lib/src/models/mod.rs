pub mod bookmark;
pub mod collection;
pub mod resolved;

pub use bookmark::BookmarkRecord;
pub use collection::{CollectionId, CollectionNode};
pub use resolved::ResolvedCollection;
