pub mod listing;
pub mod notices;
pub mod views;

pub use listing::{build_listing, Listing, ListingError, ListingParams, ListingRequest};
pub use notices::{Notice, NoticeLevel, Notices};
pub use views::{Page, Principal, Route, ViewError, ViewOutcome};
