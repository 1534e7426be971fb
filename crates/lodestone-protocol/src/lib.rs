pub mod adapter;
pub mod chat;
pub mod context;
pub mod item;
pub mod packet;
pub mod packets;

pub use adapter::{Decoded, VersionedCodec};
pub use context::ConnectionContext;
pub use item::{ComponentPatch, ComponentType, ComponentValue, ItemStack};
pub use packet::Packet;
