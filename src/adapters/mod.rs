//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements       | Connects to                  |
//! |----------------|------------------|------------------------------|
//! | `idle_timeout` | JobActivity      | Host idle-timeout state      |
//! | `log_sink`     | ScriptRunner     | Log output (simulation)      |
//! |                | ActionDispatcher |                              |
//! | `relay`        | ActionDispatcher | Feeder relay (`OutputPin`)   |
//! | `script`       | ActionDispatcher | Host G-code queue            |
//! | `time`         | Clock            | `std::time` / virtual clock  |

pub mod idle_timeout;
pub mod log_sink;
pub mod relay;
pub mod script;
pub mod time;
