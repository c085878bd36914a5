// Library surface for the game engine, the headless runtime and tests.
// Terminal drawing stays in the binary.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod input;
pub mod latch;
pub mod policy;
pub mod prime;
pub mod runtime;
pub mod session;
pub mod summary;
pub mod timer;

pub use config::GameConfig;
pub use error::ConfigError;
pub use prime::{is_prime, RequiredState};
pub use session::{Session, SessionState, Snapshot};
