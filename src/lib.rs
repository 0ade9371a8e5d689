pub mod config;
pub mod db;
pub mod models;
pub mod search;
pub mod transport;
mod utils;

pub use config::{ConfigStore, SearchConfig};
pub use db::{RepositoryError, UserRepository, UserStore};
pub use models::{Event, EventSeries, NewUser, PasswordHash, SearchCondition, SearchPage, User};
pub use search::{EventSearcher, SearchError, Searcher};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, ResponseBody, TransportError};
