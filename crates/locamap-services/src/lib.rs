pub mod location;
pub mod remote;
pub mod retry;
pub mod store;
pub mod supabase;

pub use location::Location;
pub use remote::RemoteStore;
pub use retry::{with_retry, RetryConfig};
pub use store::LocationStore;
pub use supabase::SupabaseClient;
