pub mod take;
pub mod take_storage;

pub use take::Take;
pub use take_storage::TakeStorage;
