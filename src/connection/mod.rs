mod driver;
#[cfg(feature = "mongodb")]
mod mongo;
mod registry;
mod url;

pub use driver::{Connection, Connector};
#[cfg(feature = "mongodb")]
pub use mongo::{MongoConnection, MongoConnector};
pub use registry::Registry;
pub use url::{BaseAddress, CredentialPlacement, SCHEME, credential_placement};
