pub mod keyed_lock;
pub mod signature;
pub mod time;
