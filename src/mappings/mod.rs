pub mod evdev_to_key_name;

pub use evdev_to_key_name::EvdevToKeyName;
