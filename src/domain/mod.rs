pub mod types;
pub mod watch;
pub mod seen;
pub mod state;
pub mod github;

pub use types::*;
pub use watch::*;
pub use seen::*;
pub use state::*;
pub use github::*;
