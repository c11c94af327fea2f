//! Ports for the core data service

pub mod inbound;
pub mod outbound;

pub use inbound::{
    AddEventReceipt, DescriptorUsage, EventApi, NotificationStatus, ReadingApi, RetentionApi,
    ValueDescriptorApi,
};
pub use outbound::{BusPublisher, DataStore, DeviceRef, DeviceResolver, TimeSource};
