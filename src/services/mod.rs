pub mod access_policy;
pub mod device_context;
pub mod dispatcher;
pub mod emitter;
pub mod translator;

pub use access_policy::DeviceNodePolicy;
pub use device_context::SeatContext;
pub use dispatcher::{capture, ShutdownFlag, TokioTicker};
pub use emitter::Emitter;
