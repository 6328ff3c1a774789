//! Command handlers: bridge CLI args to the firewall controller and output.

pub mod config_cmd;
pub mod firewall;
pub mod util;
