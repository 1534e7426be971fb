use lodestone_nbt::NbtValue;
use lodestone_protocol_core::text::{read_text, write_text};
use lodestone_protocol_core::{
    CodecResult, Field, Gated, Layout, PacketData, PacketIdentity, PacketReader, PacketWriter,
};
use lodestone_types::{Identifier, TextComponent, VersionRange};

use lodestone_types::ProtocolVersion::*;

const MAX_LOCALE_LEN: usize = 16;
const MAX_PACK_FIELD_LEN: usize = 32767;
pub const MAX_KNOWN_PACKS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientInformation {
    pub locale: String,
    pub view_distance: i8,
    pub chat_mode: i32,
    pub chat_colors: bool,
    pub skin_parts: u8,
    pub main_hand: i32,
    pub text_filtering: bool,
    pub allow_listing: bool,
    /// 1.21.2+.
    pub particle_status: Gated<i32>,
}

pub(crate) static CLIENT_INFORMATION: Layout<ClientInformation> = Layout::new(
    "client_information",
    &[
        Field::new(
            "settings",
            VersionRange::ALL,
            |r, p| {
                p.locale = r.read_string(MAX_LOCALE_LEN)?;
                p.view_distance = r.read_i8()?;
                p.chat_mode = r.read_varint()?;
                p.chat_colors = r.read_bool()?;
                p.skin_parts = r.read_u8()?;
                p.main_hand = r.read_varint()?;
                p.text_filtering = r.read_bool()?;
                p.allow_listing = r.read_bool()?;
                Ok(())
            },
            |w, p| {
                w.write_string(&p.locale, MAX_LOCALE_LEN)?;
                w.write_i8(p.view_distance);
                w.write_varint(p.chat_mode);
                w.write_bool(p.chat_colors);
                w.write_u8(p.skin_parts);
                w.write_varint(p.main_hand);
                w.write_bool(p.text_filtering);
                w.write_bool(p.allow_listing);
                Ok(())
            },
        ),
        Field::gated(
            "particle_status",
            VersionRange::since(V1_21_2),
            |r, p| {
                p.particle_status = Gated::Present(r.read_varint()?);
                Ok(())
            },
            |w, p| {
                w.write_varint(*p.particle_status.require("particle_status")?);
                Ok(())
            },
            |p| p.particle_status.is_present(),
        ),
    ],
);

layout_packet!(ClientInformation, CLIENT_INFORMATION);

fn read_plugin_payload(reader: &mut PacketReader<'_>) -> CodecResult<(Identifier, Vec<u8>)> {
    let channel = reader.read_identifier()?;
    Ok((channel, reader.read_rest()))
}

fn write_plugin_payload(writer: &mut PacketWriter, channel: &Identifier, data: &[u8]) -> CodecResult<()> {
    writer.write_identifier(channel)?;
    writer.write_bytes(data);
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerboundConfigPluginMessage {
    pub channel: Identifier,
    pub data: Vec<u8>,
}

impl PacketData for ServerboundConfigPluginMessage {
    const IDENTITY: PacketIdentity = PacketIdentity::ServerboundConfigPluginMessage;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        let (channel, data) = read_plugin_payload(reader)?;
        Ok(Self { channel, data })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        write_plugin_payload(writer, &self.channel, &self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientboundConfigPluginMessage {
    pub channel: Identifier,
    pub data: Vec<u8>,
}

impl PacketData for ClientboundConfigPluginMessage {
    const IDENTITY: PacketIdentity = PacketIdentity::ClientboundConfigPluginMessage;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        let (channel, data) = read_plugin_payload(reader)?;
        Ok(Self { channel, data })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        write_plugin_payload(writer, &self.channel, &self.data)
    }
}

empty_packets!(FinishConfigurationAck, FinishConfiguration);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerboundConfigKeepAlive {
    pub id: i64,
}

impl PacketData for ServerboundConfigKeepAlive {
    const IDENTITY: PacketIdentity = PacketIdentity::ServerboundConfigKeepAlive;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            id: reader.read_i64()?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_i64(self.id);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientboundConfigKeepAlive {
    pub id: i64,
}

impl PacketData for ClientboundConfigKeepAlive {
    const IDENTITY: PacketIdentity = PacketIdentity::ClientboundConfigKeepAlive;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            id: reader.read_i64()?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        writer.write_i64(self.id);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigDisconnect {
    pub reason: TextComponent,
}

impl PacketData for ConfigDisconnect {
    const IDENTITY: PacketIdentity = PacketIdentity::ConfigDisconnect;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            reason: read_text(reader)?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        write_text(writer, &self.reason)
    }
}

/// One entry of a per-registry sync. `None` means the client should use
/// the copy from a known pack.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub id: Identifier,
    pub data: Option<NbtValue>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistryData {
    /// 1.20.2 to 1.20.4: every registry in one compound.
    pub codec: Gated<NbtValue>,
    /// 1.20.5+: one registry per packet.
    pub registry: Gated<Identifier>,
    pub entries: Gated<Vec<RegistryEntry>>,
}

pub(crate) static REGISTRY_DATA: Layout<RegistryData> = Layout::new(
    "registry_data",
    &[
        Field::gated(
            "codec",
            VersionRange::between(V1_20_2, V1_20_5),
            |r, p| {
                p.codec = Gated::Present(r.read_nbt_required("codec")?);
                Ok(())
            },
            |w, p| w.write_nbt(Some(p.codec.require("codec")?)),
            |p| p.codec.is_present(),
        ),
        Field::gated(
            "registry",
            VersionRange::since(V1_20_5),
            |r, p| {
                p.registry = Gated::Present(r.read_identifier()?);
                Ok(())
            },
            |w, p| w.write_identifier(p.registry.require("registry")?),
            |p| p.registry.is_present(),
        ),
        Field::gated(
            "entries",
            VersionRange::since(V1_20_5),
            |r, p| {
                let entries = r.read_list(|r| {
                    let id = r.read_identifier()?;
                    let data = r.read_optional(|r| r.read_nbt_required("entry data"))?;
                    Ok(RegistryEntry { id, data })
                })?;
                p.entries = Gated::Present(entries);
                Ok(())
            },
            |w, p| {
                w.write_list(p.entries.require("entries")?, |w, entry| {
                    w.write_identifier(&entry.id)?;
                    w.write_optional(entry.data.as_ref(), |w, nbt| w.write_nbt(Some(nbt)))
                })
            },
            |p| p.entries.is_present(),
        ),
    ],
);

layout_packet!(RegistryData, REGISTRY_DATA);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KnownPack {
    pub namespace: String,
    pub id: String,
    pub version: String,
}

fn read_known_packs(reader: &mut PacketReader<'_>) -> CodecResult<Vec<KnownPack>> {
    reader.read_list_max(MAX_KNOWN_PACKS, |r| {
        Ok(KnownPack {
            namespace: r.read_string(MAX_PACK_FIELD_LEN)?,
            id: r.read_string(MAX_PACK_FIELD_LEN)?,
            version: r.read_string(MAX_PACK_FIELD_LEN)?,
        })
    })
}

fn write_known_packs(writer: &mut PacketWriter, packs: &[KnownPack]) -> CodecResult<()> {
    writer.write_list(packs, |w, pack| {
        w.write_string(&pack.namespace, MAX_PACK_FIELD_LEN)?;
        w.write_string(&pack.id, MAX_PACK_FIELD_LEN)?;
        w.write_string(&pack.version, MAX_PACK_FIELD_LEN)
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerboundKnownPacks {
    pub packs: Vec<KnownPack>,
}

impl PacketData for ServerboundKnownPacks {
    const IDENTITY: PacketIdentity = PacketIdentity::ServerboundKnownPacks;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            packs: read_known_packs(reader)?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        write_known_packs(writer, &self.packs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientboundKnownPacks {
    pub packs: Vec<KnownPack>,
}

impl PacketData for ClientboundKnownPacks {
    const IDENTITY: PacketIdentity = PacketIdentity::ClientboundKnownPacks;

    fn read(reader: &mut PacketReader<'_>) -> CodecResult<Self> {
        Ok(Self {
            packs: read_known_packs(reader)?,
        })
    }

    fn write(&self, writer: &mut PacketWriter) -> CodecResult<()> {
        write_known_packs(writer, &self.packs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::testing::{encode, round_trip};
    use lodestone_nbt::nbt_compound;
    use lodestone_protocol_core::CodecError;

    fn client_information() -> ClientInformation {
        ClientInformation {
            locale: "en_us".into(),
            view_distance: 12,
            chat_mode: 0,
            chat_colors: true,
            skin_parts: 0x7F,
            main_hand: 1,
            text_filtering: false,
            allow_listing: true,
            particle_status: Gated::Absent,
        }
    }

    #[test]
    fn test_particle_status_gate() {
        let info = client_information();
        let bytes = round_trip(&info, V1_20_2);
        assert_eq!(bytes.len(), 6 + 1 + 1 + 1 + 1 + 1 + 1 + 1);

        let mut writer = PacketWriter::new(V1_21_2);
        assert!(matches!(
            info.write(&mut writer),
            Err(CodecError::MissingField("particle_status"))
        ));
        let with_particles = ClientInformation {
            particle_status: Gated::Present(2),
            ..info
        };
        assert_eq!(round_trip(&with_particles, V1_21_2).len(), bytes.len() + 1);
    }

    #[test]
    fn test_registry_data_forms() {
        let whole = RegistryData {
            codec: Gated::Present(nbt_compound! {
                "minecraft:dimension_type" => nbt_compound! {},
            }),
            ..RegistryData::default()
        };
        round_trip(&whole, V1_20_3);

        let split = RegistryData {
            registry: Gated::Present(Identifier::minecraft("dimension_type")),
            entries: Gated::Present(vec![
                RegistryEntry {
                    id: Identifier::minecraft("overworld"),
                    data: None,
                },
                RegistryEntry {
                    id: Identifier::minecraft("the_nether"),
                    data: Some(nbt_compound! { "ultrawarm" => NbtValue::Byte(1) }),
                },
            ]),
            ..RegistryData::default()
        };
        round_trip(&split, V1_21);

        let mut writer = PacketWriter::new(V1_21);
        assert!(whole.write(&mut writer).is_err());
    }

    #[test]
    fn test_known_packs() {
        let packs = ClientboundKnownPacks {
            packs: vec![KnownPack {
                namespace: "minecraft".into(),
                id: "core".into(),
                version: "1.21".into(),
            }],
        };
        let bytes = round_trip(&packs, V1_21);
        assert_eq!(bytes[0], 1);
        let echoed: ServerboundKnownPacks = crate::packets::testing::decode(&bytes, V1_21);
        assert_eq!(echoed.packs, packs.packs);
        assert_eq!(encode(&echoed, V1_21), bytes);
    }

    #[test]
    fn test_plugin_message_and_disconnect() {
        round_trip(
            &ServerboundConfigPluginMessage {
                channel: Identifier::minecraft("brand"),
                data: b"\x07vanilla".to_vec(),
            },
            V1_20_2,
        );
        round_trip(
            &ClientboundConfigPluginMessage {
                channel: Identifier::minecraft("brand"),
                data: Vec::new(),
            },
            V1_21,
        );
        let json = encode(&ConfigDisconnect { reason: TextComponent::plain("x") }, V1_20_2);
        let nbt = encode(&ConfigDisconnect { reason: TextComponent::plain("x") }, V1_20_3);
        assert_ne!(json, nbt);
        round_trip(&ConfigDisconnect { reason: TextComponent::plain("x") }, V1_20_3);
        round_trip(&ServerboundConfigKeepAlive { id: 42 }, V1_20_2);
        round_trip(&ClientboundConfigKeepAlive { id: -42 }, V1_20_2);
    }
}
