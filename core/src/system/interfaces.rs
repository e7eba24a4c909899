use linkr_common::network::interface::{self, Interface};

use crate::ports::InterfaceSource;

pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn link_local_interfaces(&self) -> Vec<Interface> {
        interface::list_link_local_interfaces()
    }
}
