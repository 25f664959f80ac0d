mod memory;
mod supabase;

pub use memory::*;
pub use supabase::*;
