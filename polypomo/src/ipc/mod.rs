pub mod server;
pub mod takeover;

pub use server::{dispatch, Flow, Listener, Response};
pub use takeover::{bind_fresh, displace_running, Takeover, TakeoverPolicy};
