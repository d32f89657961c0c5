pub mod keyboard;

pub use keyboard::{KeyRecord, KeyState, RawEvent};
