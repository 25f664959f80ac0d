mod supabase;

pub use supabase::*;
