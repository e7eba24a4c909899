use colored::*;

use linkr_common::device::SysInfo;
use linkr_common::network::interface::{Interface, LINK_LOCAL_CIDR};

use crate::terminal::colors;

/// One `key: value` row of a result tree.
pub type Detail = (String, ColoredString);

pub fn interface_to_details(intf: &Interface) -> Vec<Detail> {
    let (network, prefix) = LINK_LOCAL_CIDR.split_once('/').unwrap_or((LINK_LOCAL_CIDR, ""));
    let block: ColoredString = format!(
        "{}/{}",
        network.color(colors::IPV4_ADDR),
        prefix.color(colors::IPV4_PREFIX)
    )
    .color(colors::SEPARATOR);

    vec![
        ("IPv4".to_string(), intf.local_addr.to_string().color(colors::IPV4_ADDR)),
        ("Block".to_string(), block),
    ]
}

pub fn sys_info_to_details(device_addr: &str, sys_info: &SysInfo) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![
        ("Address".to_string(), device_addr.color(colors::IPV4_ADDR)),
        ("Serial".to_string(), sys_info.serial_number.color(colors::SERIAL).bold()),
    ];

    if let Some(model) = &sys_info.model {
        details.push(("Model".to_string(), model.normal()));
    }

    match sys_info.software_versions.as_slice() {
        [] => details.push(("Software".to_string(), "unknown".dimmed())),
        versions => details.extend(
            versions
                .iter()
                .map(|version| ("Software".to_string(), version.normal())),
        ),
    }

    details
}
