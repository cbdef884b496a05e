mod reading;
mod store;
mod table;

pub use reading::ReadingStore;
pub use store::Store;
pub use table::{PrefEdit, PrefTable, PrefValue};
