mod confirmation;
mod firewall;
mod permissions;
mod registry;
