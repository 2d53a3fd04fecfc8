use crate::dns::lookup::{AnswerRecord, LookupKind, LookupOutcome, LookupStatus};
use ferrous_discovery_domain::DiscoveryError;
use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::RData;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DnsResponse {
    pub id: u16,

    pub rcode: ResponseCode,

    pub truncated: bool,

    pub answers: Vec<AnswerRecord>,

    pub min_ttl: Option<u32>,

    /// SOA minimum from the authority section, bounds negative caching.
    pub negative_soa_ttl: Option<u32>,
}

impl DnsResponse {
    pub fn is_nxdomain(&self) -> bool {
        self.rcode == ResponseCode::NXDomain
    }

    pub fn is_server_error(&self) -> bool {
        self.rcode == ResponseCode::ServFail
    }

    /// Classify the response the way the resolver reasons about lookups.
    pub fn into_outcome(self, kind: LookupKind) -> LookupOutcome {
        match self.rcode {
            ResponseCode::NoError => {
                if self.answers.iter().any(|r| r.kind() == Some(kind)) {
                    LookupOutcome::successful(self.answers)
                } else {
                    LookupOutcome::failed(
                        LookupStatus::TypeNotFound,
                        format!("no {} records in answer", kind),
                    )
                }
            }
            ResponseCode::NXDomain => LookupOutcome::failed(LookupStatus::HostNotFound, "NXDOMAIN"),
            ResponseCode::ServFail => LookupOutcome::try_again("SERVFAIL"),
            other => LookupOutcome::failed(
                LookupStatus::Unrecoverable,
                ResponseParser::rcode_to_status(other),
            ),
        }
    }
}

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(response_bytes: &[u8]) -> Result<DnsResponse, DiscoveryError> {
        let message = Message::from_vec(response_bytes).map_err(|e| {
            DiscoveryError::Resolution(format!("Failed to parse DNS response: {}", e))
        })?;

        let rcode = message.response_code();
        let truncated = message.truncated();

        let mut answers = Vec::with_capacity(message.answers().len().min(8));
        let mut min_ttl: Option<u32> = None;

        for record in message.answers() {
            let record_ttl = record.ttl();
            min_ttl = Some(min_ttl.map_or(record_ttl, |current| current.min(record_ttl)));

            match record.data() {
                RData::A(a) => answers.push(AnswerRecord::A(a.0)),
                RData::SRV(srv) => answers.push(AnswerRecord::Srv {
                    priority: srv.priority(),
                    weight: srv.weight(),
                    port: srv.port(),
                    target: Arc::from(srv.target().to_utf8()),
                }),
                _ => answers.push(AnswerRecord::Other(u16::from(record.record_type()))),
            }
        }

        let negative_soa_ttl = message.name_servers().iter().find_map(|r| {
            if let RData::SOA(soa) = r.data() {
                Some(soa.minimum().min(r.ttl()))
            } else {
                None
            }
        });

        debug!(
            rcode = ?rcode,
            answers = answers.len(),
            truncated = truncated,
            "DNS response parsed"
        );

        Ok(DnsResponse {
            id: message.id(),
            rcode,
            truncated,
            answers,
            min_ttl,
            negative_soa_ttl,
        })
    }

    pub fn rcode_to_status(rcode: ResponseCode) -> &'static str {
        match rcode {
            ResponseCode::NoError => "NOERROR",
            ResponseCode::NXDomain => "NXDOMAIN",
            ResponseCode::ServFail => "SERVFAIL",
            ResponseCode::Refused => "REFUSED",
            ResponseCode::NotImp => "NOTIMP",
            ResponseCode::FormErr => "FORMERR",
            _ => "UNKNOWN",
        }
    }
}
