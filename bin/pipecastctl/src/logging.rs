//! ---
//! pcast_section: "03-external-interfaces"
//! pcast_subsection: "binary"
//! pcast_type: "source"
//! pcast_scope: "code"
//! pcast_description: "Command-line front end for PIPECAST scenario assessment and screening."
//! pcast_version: "v0.1.0-alpha"
//! pcast_owner: "tbd"
//! ---
use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

/// Initialize a baseline tracing subscriber suitable for development.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer())
        .try_init();
}
