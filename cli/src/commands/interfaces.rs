use std::process::ExitCode;

use linkr_common::network::interface::Interface;
use linkr_core::ports::InterfaceSource;
use linkr_core::system::SystemInterfaces;

use crate::terminal::{format, print};

pub fn interfaces() -> anyhow::Result<ExitCode> {
    let interfaces: Vec<Interface> = SystemInterfaces.link_local_interfaces();
    if interfaces.is_empty() {
        print::failure("no link-local interface");
        return Ok(ExitCode::FAILURE);
    }

    for (idx, intf) in interfaces.iter().enumerate() {
        print::tree_head(idx, &intf.name);
        print::as_tree_one_level(&format::interface_to_details(intf));
    }
    Ok(ExitCode::SUCCESS)
}
