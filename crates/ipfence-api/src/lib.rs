// ipfence-api: Async client for Cosmos DB account IP rules over Azure Resource Manager

pub mod account;
pub mod auth;
pub mod error;
pub mod models;
pub mod operation;
pub mod transport;

pub use account::AccountClient;
pub use auth::{ClientCredentials, TokenCache};
pub use error::Error;
pub use models::{AccountState, IpRule, Operation, OperationStatus, PublicNetworkAccess};
pub use operation::OperationPoller;
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TlsMode, TransportConfig,
};
