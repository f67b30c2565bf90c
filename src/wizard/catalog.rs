//! Choices offered on the selection steps

use crate::api::{NetworkApi, PhoneApi, PlatformApi, UserAppIdApi};
use crate::error::{IcashError, IcashResult};
use crate::types::{Network, Platform, TransactionKind, UserAppId, UserPhone};

/// Enabled platforms
pub fn platforms<A: PlatformApi>(api: &A) -> IcashResult<Vec<Platform>> {
    Ok(api.platforms()?.into_iter().filter(|p| p.enable).collect())
}

/// Networks open for the direction
pub fn networks<A: NetworkApi>(api: &A, kind: TransactionKind) -> IcashResult<Vec<Network>> {
    Ok(api
        .networks()?
        .into_iter()
        .filter(|n| n.is_active_for(kind))
        .collect())
}

pub fn bet_ids<A: UserAppIdApi>(api: &A, platform: &Platform) -> IcashResult<Vec<UserAppId>> {
    api.user_app_ids_for(&platform.id)
}

pub fn phones<A: PhoneApi>(api: &A, network: &Network) -> IcashResult<Vec<UserPhone>> {
    crate::phone::PhoneBook::new(api).for_network(network.id)
}

/// Enabled platform by id
pub fn find_platform<A: PlatformApi>(api: &A, id: &str) -> IcashResult<Platform> {
    platforms(api)?
        .into_iter()
        .find(|p| p.id == id || p.name.eq_ignore_ascii_case(id))
        .ok_or_else(|| IcashError::not_found(format!("Plateforme introuvable: {}", id)))
}

/// Network open for the direction, by id or name
pub fn find_network<A: NetworkApi>(api: &A, kind: TransactionKind, key: &str) -> IcashResult<Network> {
    networks(api, kind)?
        .into_iter()
        .find(|n| n.id.to_string() == key || n.name.eq_ignore_ascii_case(key) || n.public_name.eq_ignore_ascii_case(key))
        .ok_or_else(|| IcashError::not_found(format!("Réseau indisponible: {}", key)))
}
