use linkr_common::network::mac;
use pnet::util::MacAddr;

use crate::ports::VendorRepository;

pub struct MacOuiRepo;

impl VendorRepository for MacOuiRepo {
    fn get_vendor(&self, mac_addr: MacAddr) -> Option<String> {
        mac::get_vendor(mac_addr)
    }
}
