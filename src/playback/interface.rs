//! Network interface lookup for binding the device connection

use std::net::IpAddr;

use crate::{Error, Result};

/// Local address of the interface called `name`
///
/// IPv4 addresses are preferred since cast devices are reached over IPv4.
///
/// # Errors
///
/// Returns [`Error::Connection`] if the interfaces cannot be listed or none
/// is called `name`
pub fn resolve(name: &str) -> Result<IpAddr> {
    let interfaces = if_addrs::get_if_addrs()
        .map_err(|e| Error::Connection(format!("cannot list network interfaces: {e}")))?;

    select_address(interfaces.iter().map(|i| (i.name.as_str(), i.ip())), name)
        .ok_or_else(|| Error::Connection(format!("unable to find interface {name:?}")))
}

fn select_address<'a>(
    interfaces: impl IntoIterator<Item = (&'a str, IpAddr)>,
    name: &str,
) -> Option<IpAddr> {
    let mut fallback = None;

    for (iface, ip) in interfaces {
        if iface != name {
            continue;
        }
        if ip.is_ipv4() {
            return Some(ip);
        }
        fallback.get_or_insert(ip);
    }

    fallback
}
