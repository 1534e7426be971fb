pub mod adapter;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod gated;
pub mod id_set;
pub mod identity;
pub mod layout;
pub mod registry;
pub mod state;
pub mod text;

pub use adapter::PacketData;
pub use buffer::{Checkpoint, PacketReader, PacketWriter};
pub use config::{CodecConfig, UnrecognizedPolicy};
pub use error::{CodecError, CodecResult, ErrorContext, ErrorKind, ProtocolError};
pub use gated::Gated;
pub use id_set::MappedEntitySet;
pub use identity::PacketIdentity;
pub use layout::{Field, Layout, LayoutError};
pub use registry::{packet_registry, PacketRegistry, RegistryError};
pub use state::{ConnectionPhase, Direction, HandshakeIntent};
