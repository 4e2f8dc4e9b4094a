pub mod supervisor;

pub use supervisor::{
    ConnectionState, ConnectionSupervisor, DisconnectHandle, SupervisorConfig, ViewerEvent,
};
