mod consumer;
mod permission;

pub use consumer::*;
pub use permission::*;
