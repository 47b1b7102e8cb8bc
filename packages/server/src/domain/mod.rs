//! Domain layer: value objects, entities and the ports implemented by the
//! infrastructure layer.

pub mod entity;
pub mod error;
pub mod group;
pub mod pusher;
pub mod registry;
pub mod source;
pub mod value_object;

pub use entity::{ActivityEvent, ActivityKind, Connection, Message};
pub use error::{MessagePushError, MessageSourceError, RegistryError, ValueObjectError};
pub use group::GroupIndex;
pub use pusher::{
    DeliveryReport, MessagePusher, Notification, OUTBOUND_QUEUE_CAPACITY, PusherChannel,
    PusherReceiver, pusher_channel,
};
pub use registry::ConnectionRegistry;
pub use source::MessageSource;
pub use value_object::{
    ConnectionId, GroupName, MessageCategory, MessageContent, MessageId, Timestamp,
};
