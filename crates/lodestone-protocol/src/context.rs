use crate::adapter::{Decoded, VersionedCodec};
use crate::packet::Packet;
use bytes::BytesMut;
use lodestone_protocol_core::{
    ConnectionPhase, Direction, ErrorContext, ErrorKind, HandshakeIntent, ProtocolError,
    UnrecognizedPolicy,
};
use lodestone_types::ProtocolVersion;
use tracing::{debug, warn};

/// One side of one connection: tracks the phase and version, and what the
/// peer has told us along the way.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    codec: VersionedCodec,
    inbound: Direction,
    phase: ConnectionPhase,
    /// Only meaningful once the handshake has been seen; the handshake itself
    /// reads the same in every version.
    version: ProtocolVersion,
    username: Option<String>,
    last_tab_complete: Option<String>,
}

impl ConnectionContext {
    /// A context that decodes `inbound` packets and encodes the other direction.
    pub fn new(codec: VersionedCodec, inbound: Direction) -> Self {
        Self {
            codec,
            inbound,
            phase: ConnectionPhase::Handshake,
            version: ProtocolVersion::OLDEST,
            username: None,
            last_tab_complete: None,
        }
    }

    /// Server side of a connection.
    pub fn server(codec: VersionedCodec) -> Self {
        Self::new(codec, Direction::Serverbound)
    }

    /// Client side of a connection.
    pub fn client(codec: VersionedCodec) -> Self {
        Self::new(codec, Direction::Clientbound)
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// The text of the most recent tab-complete request.
    pub fn last_tab_complete(&self) -> Option<&str> {
        self.last_tab_complete.as_deref()
    }

    fn context(&self, direction: Direction) -> ErrorContext {
        ErrorContext::new(self.phase, direction, self.version)
    }

    /// Decode the next frame from `buf`.
    ///
    /// Unrecognized packets are handled per the configured policy: returned
    /// as-is, skipped, or turned into an error.
    pub fn decode(&mut self, buf: &mut BytesMut) -> Result<Decoded, ProtocolError> {
        loop {
            let decoded = self
                .codec
                .decode_frame(buf, self.phase, self.inbound, self.version)?;
            match decoded {
                Decoded::Packet(packet) => {
                    self.observe(&packet, self.inbound)?;
                    return Ok(Decoded::Packet(packet));
                }
                Decoded::Unrecognized { id, payload } => match self.codec.config().unrecognized {
                    UnrecognizedPolicy::Forward => {
                        warn!(
                            "Forwarding unrecognized packet id=0x{:02X} in {} ({} bytes)",
                            id,
                            self.phase,
                            payload.len()
                        );
                        return Ok(Decoded::Unrecognized { id, payload });
                    }
                    UnrecognizedPolicy::Drop => {
                        warn!(
                            "Dropping unrecognized packet id=0x{:02X} in {} ({} bytes)",
                            id,
                            self.phase,
                            payload.len()
                        );
                    }
                    UnrecognizedPolicy::Reject => {
                        return Err(ProtocolError::new(
                            ErrorKind::UnrecognizedPacketIdentity,
                            self.context(self.inbound).with_packet_id(id),
                        ));
                    }
                },
                Decoded::NeedMoreBytes => return Ok(Decoded::NeedMoreBytes),
            }
        }
    }

    /// Encode `packet` as a frame in the current phase and version.
    pub fn encode(&mut self, packet: &Packet) -> Result<BytesMut, ProtocolError> {
        let identity = packet.identity();
        if identity.direction() == self.inbound {
            return Err(ProtocolError::new(
                ErrorKind::IllegalPhaseTransition,
                self.context(identity.direction()).with_identity(identity),
            ));
        }
        let frame = self.codec.encode_frame(packet, self.phase, self.version)?;
        self.observe(packet, identity.direction())?;
        Ok(frame)
    }

    fn observe(&mut self, packet: &Packet, direction: Direction) -> Result<(), ProtocolError> {
        let mut intent: Option<HandshakeIntent> = None;
        match packet {
            Packet::Handshake(handshake) => {
                let clamp = self.codec.config().version_clamp;
                self.version = ProtocolVersion::resolve(handshake.protocol_version, clamp)
                    .map_err(|e| {
                        let mut err = ProtocolError::unsupported_version(e);
                        err.context = self.context(direction).with_identity(packet.identity());
                        err
                    })?;
                intent = Some(handshake.intent);
                debug!(
                    "Handshake: protocol={} ({}), intent={:?}",
                    handshake.protocol_version, self.version, handshake.intent
                );
            }
            Packet::LoginStart(login) => {
                debug!("Login start from {}", login.name);
                self.username = Some(login.name.clone());
            }
            Packet::LoginSuccess(success) => {
                self.username = Some(success.username.clone());
            }
            Packet::CommandSuggestionsRequest(request) => {
                self.last_tab_complete = Some(request.text.clone());
            }
            _ => {}
        }

        self.phase = self
            .phase
            .next(direction, packet.identity(), intent, self.version)?;
        Ok(())
    }
}
