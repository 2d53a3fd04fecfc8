#![allow(dead_code)]
#![allow(unused_imports)]

pub mod dns_server_mock;
pub mod mock_health_client;
pub mod mock_lookup;

pub use dns_server_mock::{MockAnswer, MockDnsServer, MockZone};
pub use mock_health_client::MockHealthClient;
pub use mock_lookup::MockRecordLookup;
pub use mock_resolver::MockServiceResolver;
