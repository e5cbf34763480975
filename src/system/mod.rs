// System integration module
// Access to the agent session gateway that runs alongside the pipeline

pub mod sessions;

pub use sessions::{
    from_config, FixtureSessionProvider, LiveSessionProvider, Session, SessionHistory,
    SessionMessage, SessionProvider,
};
