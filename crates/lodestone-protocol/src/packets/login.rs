use lodestone_protocol_core::text::{read_json_text, write_json_text};
use lodestone_protocol_core::{
    CodecError, CodecResult, Field, Gated, Layout, PacketData, PacketIdentity, PacketReader,
    PacketWriter,
};
use lodestone_types::{Identifier, ProfileProperty, TextComponent, VersionRange};
use uuid::Uuid;

use lodestone_types::ProtocolVersion::*;

pub const MAX_USERNAME_LEN: usize = 16;
const MAX_SERVER_ID_LEN: usize = 20;
const MAX_PUBLIC_KEY_LEN: usize = 512;
const MAX_KEY_SIGNATURE_LEN: usize = 4096;
const MAX_PROPERTY_NAME_LEN: usize = 64;
const MAX_PROPERTY_VALUE_LEN: usize = 32767;
const MAX_PROPERTY_SIGNATURE_LEN: usize = 1024;

/// The chat-signing key a 1.19 to 1.19.2 client presents at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyData {
    pub expires_at: i64,
    pub key: Vec<u8>,
    pub signature: Vec<u8>,
}

impl PublicKeyData {
    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            expires_at: reader.read_i64()?,
            key: reader.read_byte_array_max(MAX_PUBLIC_KEY_LEN)?,
            signature: reader.read_byte_array_max(MAX_KEY_SIGNATURE_LEN)?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_i64(self.expires_at);
        writer.write_byte_array(&self.key);
        writer.write_byte_array(&self.signature);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginStart {
    pub name: String,
    /// 1.19 to 1.19.2.
    pub signature_data: Gated<Option<PublicKeyData>>,
    /// Optional in 1.19.1 to 1.20.1, mandatory from 1.20.2.
    pub player_uuid: Gated<Option<Uuid>>,
}

pub(crate) static LOGIN_START: Layout<LoginStart> = Layout::new(
    "login_start",
    &[
        Field::new(
            "name",
            VersionRange::ALL,
            |r, p| {
                p.name = r.read_string(MAX_USERNAME_LEN)?;
                Ok(())
            },
            |w, p| w.write_string(&p.name, MAX_USERNAME_LEN),
        ),
        Field::gated(
            "signature_data",
            VersionRange::between(V1_19, V1_19_3),
            |r, p| {
                p.signature_data = Gated::Present(r.read_optional(PublicKeyData::read)?);
                Ok(())
            },
            |w, p| {
                let data = p.signature_data.require("signature_data")?;
                w.write_optional(data.as_ref(), |w, data| data.write(w))
            },
            |p| p.signature_data.is_present(),
        ),
        Field::gated(
            "player_uuid",
            VersionRange::between(V1_19_1, V1_20_2),
            |r, p| {
                p.player_uuid = Gated::Present(r.read_optional(|r| r.read_uuid())?);
                Ok(())
            },
            |w, p| {
                let uuid = p.player_uuid.require("player_uuid")?;
                w.write_optional(uuid.as_ref(), |w, uuid| {
                    w.write_uuid(uuid);
                    Ok(())
                })
            },
            |p| p.player_uuid.is_present(),
        ),
        Field::gated(
            "player_uuid",
            VersionRange::since(V1_20_2),
            |r, p| {
                p.player_uuid = Gated::Present(Some(r.read_uuid()?));
                Ok(())
            },
            |w, p| {
                let uuid = p
                    .player_uuid
                    .require("player_uuid")?
                    .ok_or(CodecError::MissingField("player_uuid"))?;
                w.write_uuid(&uuid);
                Ok(())
            },
            |p| p.player_uuid.is_present(),
        ),
    ],
);

layout_packet!(LoginStart, LOGIN_START);

/// Proof that the client holds the verify token, or (1.19 to 1.19.2 only)
/// a signature made with its chat key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncryptionVerifier {
    Token(Vec<u8>),
    Signed { salt: i64, signature: Vec<u8> },
}

impl Default for EncryptionVerifier {
    fn default() -> Self {
        EncryptionVerifier::Token(Vec::new())
    }
}

impl EncryptionVerifier {
    fn write_token(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        match self {
            EncryptionVerifier::Token(token) => {
                writer.write_byte_array(token);
                Ok(())
            }
            EncryptionVerifier::Signed { .. } => Err(CodecError::FieldNotInVersion {
                field: "signed verifier",
                version: writer.version(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncryptionResponse {
    pub shared_secret: Vec<u8>,
    pub verifier: EncryptionVerifier,
}

pub(crate) static ENCRYPTION_RESPONSE: Layout<EncryptionResponse> = Layout::new(
    "encryption_response",
    &[
        Field::new(
            "shared_secret",
            VersionRange::ALL,
            |r, p| {
                p.shared_secret = r.read_byte_array()?;
                Ok(())
            },
            |w, p| {
                w.write_byte_array(&p.shared_secret);
                Ok(())
            },
        ),
        Field::new(
            "verifier",
            VersionRange::until(V1_19),
            |r, p| {
                p.verifier = EncryptionVerifier::Token(r.read_byte_array()?);
                Ok(())
            },
            |w, p| p.verifier.write_token(w),
        ),
        Field::new(
            "verifier",
            VersionRange::between(V1_19, V1_19_3),
            |r, p| {
                p.verifier = if r.read_bool()? {
                    EncryptionVerifier::Token(r.read_byte_array()?)
                } else {
                    EncryptionVerifier::Signed {
                        salt: r.read_i64()?,
                        signature: r.read_byte_array()?,
                    }
                };
                Ok(())
            },
            |w, p| {
                match &p.verifier {
                    EncryptionVerifier::Token(token) => {
                        w.write_bool(true);
                        w.write_byte_array(token);
                    }
                    EncryptionVerifier::Signed { salt, signature } => {
                        w.write_bool(false);
                        w.write_i64(*salt);
                        w.write_byte_array(signature);
                    }
                }
                Ok(())
            },
        ),
        Field::new(
            "verifier",
            VersionRange::since(V1_19_3),
            |r, p| {
                p.verifier = EncryptionVerifier::Token(r.read_byte_array()?);
                Ok(())
            },
            |w, p| p.verifier.write_token(w),
        ),
    ],
);

layout_packet!(EncryptionResponse, ENCRYPTION_RESPONSE);

/// Answer to a login plugin request. `None` means the channel is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginPluginResponse {
    pub message_id: i32,
    pub data: Option<Vec<u8>>,
}

impl PacketData for LoginPluginResponse {
    const IDENTITY: PacketIdentity = PacketIdentity::LoginPluginResponse;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        let message_id = reader.read_varint()?;
        let data = reader.read_optional(|r| Ok(r.read_rest()))?;
        Ok(Self { message_id, data })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_varint(self.message_id);
        writer.write_optional(self.data.as_ref(), |w, data| {
            w.write_bytes(data);
            Ok(())
        })
    }
}

empty_packets!(LoginAcknowledged);

/// Kick during login. The reason is JSON in every version.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoginDisconnect {
    pub reason: TextComponent,
}

impl PacketData for LoginDisconnect {
    const IDENTITY: PacketIdentity = PacketIdentity::LoginDisconnect;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            reason: read_json_text(reader)?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        write_json_text(writer, &self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncryptionRequest {
    pub server_id: String,
    pub public_key: Vec<u8>,
    pub verify_token: Vec<u8>,
    /// 1.20.5+.
    pub should_authenticate: Gated<bool>,
}

pub(crate) static ENCRYPTION_REQUEST: Layout<EncryptionRequest> = Layout::new(
    "encryption_request",
    &[
        Field::new(
            "server_id",
            VersionRange::ALL,
            |r, p| {
                p.server_id = r.read_string(MAX_SERVER_ID_LEN)?;
                Ok(())
            },
            |w, p| w.write_string(&p.server_id, MAX_SERVER_ID_LEN),
        ),
        Field::new(
            "public_key",
            VersionRange::ALL,
            |r, p| {
                p.public_key = r.read_byte_array()?;
                Ok(())
            },
            |w, p| {
                w.write_byte_array(&p.public_key);
                Ok(())
            },
        ),
        Field::new(
            "verify_token",
            VersionRange::ALL,
            |r, p| {
                p.verify_token = r.read_byte_array()?;
                Ok(())
            },
            |w, p| {
                w.write_byte_array(&p.verify_token);
                Ok(())
            },
        ),
        Field::gated(
            "should_authenticate",
            VersionRange::since(V1_20_5),
            |r, p| {
                p.should_authenticate = Gated::Present(r.read_bool()?);
                Ok(())
            },
            |w, p| {
                w.write_bool(*p.should_authenticate.require("should_authenticate")?);
                Ok(())
            },
            |p| p.should_authenticate.is_present(),
        ),
    ],
);

layout_packet!(EncryptionRequest, ENCRYPTION_REQUEST);

fn read_property(reader: &mut PacketReader<'_>) -> CodecResult<ProfileProperty> {
    Ok(ProfileProperty {
        name: reader.read_string(MAX_PROPERTY_NAME_LEN)?,
        value: reader.read_string(MAX_PROPERTY_VALUE_LEN)?,
        signature: reader.read_optional(|r| r.read_string(MAX_PROPERTY_SIGNATURE_LEN))?,
    })
}

fn write_property(writer: &mut PacketWriter, property: &ProfileProperty) -> CodecResult<()> {
    writer.write_string(&property.name, MAX_PROPERTY_NAME_LEN)?;
    writer.write_string(&property.value, MAX_PROPERTY_VALUE_LEN)?;
    writer.write_optional(property.signature.as_ref(), |w, sig| {
        w.write_string(sig, MAX_PROPERTY_SIGNATURE_LEN)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoginSuccess {
    pub uuid: Uuid,
    pub username: String,
    /// 1.19+.
    pub properties: Gated<Vec<ProfileProperty>>,
    /// 1.20.5 and 1.21 only.
    pub strict_error_handling: Gated<bool>,
}

pub(crate) static LOGIN_SUCCESS: Layout<LoginSuccess> = Layout::new(
    "login_success",
    &[
        Field::new(
            "uuid",
            VersionRange::until(V1_16),
            |r, p| {
                p.uuid = Uuid::parse_str(&r.read_string(36)?)?;
                Ok(())
            },
            |w, p| w.write_string(&p.uuid.hyphenated().to_string(), 36),
        ),
        Field::new(
            "uuid",
            VersionRange::since(V1_16),
            |r, p| {
                p.uuid = r.read_uuid()?;
                Ok(())
            },
            |w, p| {
                w.write_uuid(&p.uuid);
                Ok(())
            },
        ),
        Field::new(
            "username",
            VersionRange::ALL,
            |r, p| {
                p.username = r.read_string(MAX_USERNAME_LEN)?;
                Ok(())
            },
            |w, p| w.write_string(&p.username, MAX_USERNAME_LEN),
        ),
        Field::gated(
            "properties",
            VersionRange::since(V1_19),
            |r, p| {
                p.properties = Gated::Present(r.read_list(read_property)?);
                Ok(())
            },
            |w, p| w.write_list(p.properties.require("properties")?, write_property),
            |p| p.properties.is_present(),
        ),
        Field::gated(
            "strict_error_handling",
            VersionRange::between(V1_20_5, V1_21_2),
            |r, p| {
                p.strict_error_handling = Gated::Present(r.read_bool()?);
                Ok(())
            },
            |w, p| {
                w.write_bool(*p.strict_error_handling.require("strict_error_handling")?);
                Ok(())
            },
            |p| p.strict_error_handling.is_present(),
        ),
    ],
);

layout_packet!(LoginSuccess, LOGIN_SUCCESS);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SetCompression {
    pub threshold: i32,
}

impl PacketData for SetCompression {
    const IDENTITY: PacketIdentity = PacketIdentity::SetCompression;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            threshold: reader.read_varint()?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_varint(self.threshold);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPluginRequest {
    pub message_id: i32,
    pub channel: Identifier,
    pub data: Vec<u8>,
}

impl PacketData for LoginPluginRequest {
    const IDENTITY: PacketIdentity = PacketIdentity::LoginPluginRequest;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            message_id: reader.read_varint()?,
            channel: reader.read_identifier()?,
            data: reader.read_rest(),
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_varint(self.message_id);
        writer.write_identifier(&self.channel)?;
        writer.write_bytes(&self.data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::testing::{encode, round_trip};
    use lodestone_types::ProtocolVersion;

    fn steve() -> Uuid {
        Uuid::from_u128(0x069a79f444e94726a5befca90e38aaf5)
    }

    #[test]
    fn test_login_start_brackets() {
        let legacy = LoginStart {
            name: "Steve".into(),
            ..LoginStart::default()
        };
        assert_eq!(round_trip(&legacy, V1_18_2).len(), 6);

        let signed = LoginStart {
            name: "Steve".into(),
            signature_data: Gated::Present(Some(PublicKeyData {
                expires_at: 1_700_000_000_000,
                key: vec![1; 32],
                signature: vec![2; 64],
            })),
            player_uuid: Gated::Absent,
        };
        round_trip(&signed, V1_19);

        let with_uuid = LoginStart {
            signature_data: Gated::Present(None),
            player_uuid: Gated::Present(Some(steve())),
            ..signed.clone()
        };
        round_trip(&with_uuid, V1_19_1);

        let keyless = LoginStart {
            name: "Steve".into(),
            signature_data: Gated::Absent,
            player_uuid: Gated::Present(None),
        };
        round_trip(&keyless, V1_19_3);

        let modern = LoginStart {
            player_uuid: Gated::Present(Some(steve())),
            ..keyless.clone()
        };
        assert_eq!(round_trip(&modern, V1_20_2).len(), 6 + 16);

        let mut writer = PacketWriter::new(V1_20_2);
        assert!(matches!(
            keyless.write(&mut writer),
            Err(CodecError::MissingField("player_uuid"))
        ));
        let mut writer = PacketWriter::new(V1_19_3);
        assert!(matches!(
            signed.write(&mut writer),
            Err(CodecError::FieldNotInVersion {
                field: "signature_data",
                ..
            })
        ));
    }

    #[test]
    fn test_encryption_response_brackets() {
        let token = EncryptionResponse {
            shared_secret: vec![7; 16],
            verifier: EncryptionVerifier::Token(vec![1, 2, 3, 4]),
        };
        for version in [V1_8, V1_19, V1_19_3, V1_21] {
            round_trip(&token, version);
        }
        assert_eq!(encode(&token, V1_19).len(), encode(&token, V1_8).len() + 1);

        let signed = EncryptionResponse {
            shared_secret: vec![7; 16],
            verifier: EncryptionVerifier::Signed {
                salt: 99,
                signature: vec![3; 8],
            },
        };
        round_trip(&signed, V1_19_1);
        let mut writer = PacketWriter::new(V1_19_3);
        assert!(signed.write(&mut writer).is_err());
    }

    #[test]
    fn test_login_success_uuid_forms() {
        let mut success = LoginSuccess {
            uuid: steve(),
            username: "Notch".into(),
            ..LoginSuccess::default()
        };
        let legacy = round_trip(&success, V1_15_2);
        assert_eq!(legacy[0], 36);
        assert_eq!(&legacy[1..37], b"069a79f4-44e9-4726-a5be-fca90e38aaf5");
        assert_eq!(round_trip(&success, V1_16).len(), 16 + 6);

        success.properties = Gated::Present(vec![ProfileProperty {
            name: "textures".into(),
            value: "e30=".into(),
            signature: Some("c2ln".into()),
        }]);
        round_trip(&success, V1_20_3);

        success.strict_error_handling = Gated::Present(true);
        round_trip(&success, V1_21);
        let mut writer = PacketWriter::new(V1_21_2);
        assert!(success.write(&mut writer).is_err());
    }

    #[test]
    fn test_bad_uuid_string() {
        let mut writer = PacketWriter::new(V1_12_2);
        writer.write_string("not-a-uuid", 36).unwrap();
        writer.write_string("Notch", 16).unwrap();
        let bytes = writer.into_inner();
        let mut reader = PacketReader::new(&bytes, V1_12_2);
        assert!(matches!(
            LoginSuccess::read(&mut reader),
            Err(CodecError::InvalidUuid(_))
        ));
    }

    #[test]
    fn test_plugin_messages() {
        let request = LoginPluginRequest {
            message_id: 3,
            channel: Identifier::new("velocity", "player_info"),
            data: vec![1],
        };
        round_trip(&request, V1_13);
        round_trip(
            &LoginPluginResponse {
                message_id: 3,
                data: None,
            },
            V1_13,
        );
        round_trip(
            &LoginPluginResponse {
                message_id: 3,
                data: Some(vec![9, 9]),
            },
            V1_20_2,
        );
    }

    #[test]
    fn test_disconnect_stays_json() {
        let kick = LoginDisconnect {
            reason: TextComponent::plain("bye"),
        };
        let bytes = round_trip(&kick, ProtocolVersion::NEWEST);
        assert_eq!(&bytes[1..], br#"{"text":"bye"}"#);
        round_trip(&EncryptionRequest::default(), V1_8);
        round_trip(
            &EncryptionRequest {
                should_authenticate: Gated::Present(true),
                ..EncryptionRequest::default()
            },
            V1_20_5,
        );
        round_trip(&SetCompression { threshold: 256 }, V1_8);
    }
}
