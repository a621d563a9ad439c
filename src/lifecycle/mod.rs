mod manager;
mod policy;

pub use manager::{LifecycleManager, SweepReport};
pub use policy::LifecyclePolicy;
