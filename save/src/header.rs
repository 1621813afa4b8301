//! The fixed-layout header at the front of a save's level stream (§4.12).

use fmm_codec::{CodecResult, PropertyTree, Reader};
use fmm_model::{GameVersion, Version};

/// One entry of the header's MOD manifest. Every MOD listed in a save is
/// treated as enabled; the save format carries no disabled-MOD records.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveMod {
    pub name: String,
    pub version: Version,
    pub crc: u32,
}

/// The three fields between `allowed_commands` and the MOD count whose
/// purpose the format does not name. Preserved so a future write side could
/// reproduce the exact byte layout.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ReservedFields {
    pub flag_a: bool,
    pub value: u32,
    pub flag_b: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SaveHeader {
    pub game_version: GameVersion,
    pub campaign: String,
    pub level_name: String,
    pub base_mod: String,
    pub difficulty: u8,
    pub finished: bool,
    pub player_won: bool,
    pub replay_active: bool,
    pub mod_version: Version,
    pub build: u16,
    pub allowed_commands: u8,
    pub reserved: ReservedFields,
    pub mods: Vec<SaveMod>,
    pub startup_settings: PropertyTree,
}

/// Parses the fixed header plus trailing property tree from the
/// decompressed level stream, in exact field order (§4.12).
pub fn read_header(reader: &mut Reader) -> CodecResult<SaveHeader> {
    let game_version = reader.read_game_version()?;
    reader.skip(1)?;

    let campaign = reader.read_string()?;
    let level_name = reader.read_string()?;
    let base_mod = reader.read_string()?;

    let difficulty = reader.read_u8()?;

    let finished = reader.read_bool()?;
    let player_won = reader.read_bool()?;
    let replay_active = reader.read_bool()?;

    let mod_version = reader.read_version3()?;
    let build = reader.read_u16()?;
    let allowed_commands = reader.read_u8()?;

    let reserved = ReservedFields {
        flag_a: reader.read_bool()?,
        value: reader.read_u32()?,
        flag_b: reader.read_bool()?,
    };

    let mod_count = reader.read_space_optim_u32()?;
    let mut mods = Vec::with_capacity(mod_count as usize);
    for _ in 0..mod_count {
        mods.push(SaveMod {
            name: reader.read_string()?,
            version: reader.read_version3()?,
            crc: reader.read_u32()?,
        });
    }

    reader.skip(4)?;
    let startup_settings = fmm_codec::decode(reader)?;

    Ok(SaveHeader {
        game_version,
        campaign,
        level_name,
        base_mod,
        difficulty,
        finished,
        player_won,
        replay_active,
        mod_version,
        build,
        allowed_commands,
        reserved,
        mods,
        startup_settings,
    })
}
