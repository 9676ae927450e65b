//! Collaborator abstraction trait definition

mod destination_registry;
mod print_server_registry;
mod provisional_resolver;

pub use destination_registry::DestinationRegistry;
pub use print_server_registry::PrintServerRegistry;
pub use provisional_resolver::ProvisionalResolver;
