//! In-process registry adapters for frontends without a native print backend (CLI, tests).

mod in_memory_destination_registry;
mod in_memory_print_server_registry;

pub use in_memory_destination_registry::InMemoryDestinationRegistry;
pub use in_memory_print_server_registry::InMemoryPrintServerRegistry;
