pub mod guest;

pub use guest::GuestKernel;
