//! Input and output data of the pipeline.

pub mod canonical;
pub mod raw;

pub use canonical::{
    Acl, AclAction, AclEntry, CanonicalConfig, DeviceInfo, EnableCredential, Interface,
    InterfaceStatus, OtherServices, ProtocolType, RoutingProtocol, SecurityFeatures, SnmpAccess,
    SnmpConfig, SnmpVersion, StaticRoute, SwitchportMode, Vlan, VlanRef, MAX_VLAN_ID, MIN_VLAN_ID,
};
pub use raw::{RawConfig, Vendor};
