pub mod dedup;
pub mod lister;
pub mod models;
pub mod pagination;
pub mod recurring;

pub use lister::{BookingLister, ListingError};
pub use models::{BookingListFilters, BookingListPage, ListBookingsRequest, RecurringInfo};
