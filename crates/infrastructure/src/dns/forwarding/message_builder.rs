//! DNS Message Builder
//!
//! Constructs SRV and A query messages in wire format using `hickory-proto`.

use crate::dns::lookup::LookupKind;
use ferrous_discovery_domain::DiscoveryError;
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;

/// Builds DNS query messages in wire format
pub struct MessageBuilder;

impl MessageBuilder {
    /// Build a recursive query for `name` and return its ID with the bytes.
    ///
    /// The ID is random and is what the response has to echo back.
    pub fn build_query(name: &str, kind: LookupKind) -> Result<(u16, Vec<u8>), DiscoveryError> {
        let name = Self::parse_name(name)?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(Self::record_type(kind));
        query.set_query_class(DNSClass::IN);

        let id = fastrand::u16(..);

        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);

        let bytes = Self::serialize_message(&message)?;
        Ok((id, bytes))
    }

    /// Parse a service or host name, rejecting anything DNS cannot carry.
    pub fn parse_name(name: &str) -> Result<Name, DiscoveryError> {
        if name.trim().is_empty() {
            return Err(DiscoveryError::Resolution(
                "Invalid service name: name is empty".into(),
            ));
        }
        Name::from_str(name).map_err(|e| {
            DiscoveryError::Resolution(format!("Invalid service name '{}': {}", name, e))
        })
    }

    pub fn record_type(kind: LookupKind) -> RecordType {
        match kind {
            LookupKind::Srv => RecordType::SRV,
            LookupKind::A => RecordType::A,
        }
    }

    fn serialize_message(message: &Message) -> Result<Vec<u8>, DiscoveryError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            DiscoveryError::Resolution(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }
}
