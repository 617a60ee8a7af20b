mod owner;
mod shutdown;

pub(crate) use owner::ThreadOwner;
pub use shutdown::ShutdownToken;
