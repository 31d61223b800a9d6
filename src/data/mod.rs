pub mod availability;
pub mod booking;
pub mod rpde;
pub mod shared_slot;
pub mod window;
