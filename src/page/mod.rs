mod base;
mod memory;
mod terminal;

pub use base::Page;
pub use memory::MemoryPage;
pub use terminal::TerminalPage;
