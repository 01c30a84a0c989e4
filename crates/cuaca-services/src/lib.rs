//! Adapters for the region directory and the remote bookmark store.

pub mod bookmark;
mod id;
pub mod region;

pub use bookmark::{Bookmark, BookmarkClient, BookmarkError, BookmarkStore};
pub use region::{
    CloudAlertDirectory, EmsifaDirectory, Province, Regency, RegionDirectory, RegionError,
};
