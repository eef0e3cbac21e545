//! Request middleware.

pub mod ip_guard;
pub mod panic;

pub use ip_guard::ip_guard;
pub use panic::handle_panic;
