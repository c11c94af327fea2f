//! Adapters implementing the outbound ports.

pub mod bus;
pub mod device_registry;
pub mod memory_store;
pub mod time;

pub use bus::SharedBusPublisher;
pub use device_registry::StaticDeviceResolver;
pub use memory_store::InMemoryDataStore;
pub use time::{ManualTimeSource, SystemTimeSource};
