use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

const TYPE_A: u16 = 1;
const TYPE_SRV: u16 = 33;
const RCODE_SERVFAIL: u8 = 2;
const RCODE_NXDOMAIN: u8 = 3;

#[derive(Debug, Clone)]
pub enum MockAnswer {
    A(Ipv4Addr),
    Srv { port: u16, target: String },
}

impl MockAnswer {
    fn record_type(&self) -> u16 {
        match self {
            Self::A(_) => TYPE_A,
            Self::Srv { .. } => TYPE_SRV,
        }
    }
}

/// Canned answers served by [`MockDnsServer`]
///
/// A name that was never added answers NXDOMAIN; a known name asked for a
/// type it has no record of answers NOERROR with an empty answer section.
#[derive(Debug, Clone, Default)]
pub struct MockZone {
    records: HashMap<String, Vec<MockAnswer>>,
    ttl: u32,
    servfail: bool,
    truncate_udp: bool,
}

impl MockZone {
    pub fn new() -> Self {
        Self {
            ttl: 60,
            ..Self::default()
        }
    }

    pub fn srv(mut self, name: &str, port: u16, target: &str) -> Self {
        self.records
            .entry(normalize(name))
            .or_default()
            .push(MockAnswer::Srv {
                port,
                target: target.to_string(),
            });
        self
    }

    pub fn a(mut self, name: &str, ip: Ipv4Addr) -> Self {
        self.records
            .entry(normalize(name))
            .or_default()
            .push(MockAnswer::A(ip));
        self
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Answer every query with SERVFAIL
    pub fn servfail(mut self) -> Self {
        self.servfail = true;
        self
    }

    /// Answer UDP with an empty truncated response, TCP with the records
    pub fn truncate_udp(mut self) -> Self {
        self.truncate_udp = true;
        self
    }

    /// The `namenode.service.lc.` fixture
    pub fn namenode() -> Self {
        Self::new()
            .srv("namenode.service.lc.", 8020, "node0.lc.")
            .srv("namenode.service.lc.", 8020, "node1.lc.")
            .a("node0.lc.", Ipv4Addr::new(10, 0, 0, 1))
            .a("node1.lc.", Ipv4Addr::new(10, 0, 0, 2))
    }
}

/// DNS server on localhost answering from a [`MockZone`], over UDP and TCP
/// on the same port.
pub struct MockDnsServer {
    addr: SocketAddr,
    udp_queries: Arc<AtomicUsize>,
    tcp_queries: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start(zone: MockZone) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let listener = TcpListener::bind(addr).await?;

        let zone = Arc::new(zone);
        let udp_queries = Arc::new(AtomicUsize::new(0));
        let tcp_queries = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let udp_zone = Arc::clone(&zone);
        let udp_count = Arc::clone(&udp_queries);
        let tcp_count = Arc::clone(&tcp_queries);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    result = socket.recv_from(&mut buf) => {
                        if let Ok((len, peer)) = result {
                            udp_count.fetch_add(1, Ordering::SeqCst);
                            let response =
                                build_response(&buf[..len], &udp_zone, udp_zone.truncate_udp);
                            let _ = socket.send_to(&response, peer).await;
                        }
                    }
                    accepted = listener.accept() => {
                        if let Ok((stream, _)) = accepted {
                            tcp_count.fetch_add(1, Ordering::SeqCst);
                            tokio::spawn(serve_tcp(stream, Arc::clone(&zone)));
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            udp_queries,
            tcp_queries,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_queries(&self) -> usize {
        self.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.tcp_queries.load(Ordering::SeqCst)
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve_tcp(mut stream: tokio::net::TcpStream, zone: Arc<MockZone>) {
    let mut len_buf = [0u8; 2];
    if stream.read_exact(&mut len_buf).await.is_err() {
        return;
    }
    let mut query = vec![0u8; u16::from_be_bytes(len_buf) as usize];
    if stream.read_exact(&mut query).await.is_err() {
        return;
    }

    let response = build_response(&query, &zone, false);
    let mut framed = Vec::with_capacity(response.len() + 2);
    framed.extend_from_slice(&(response.len() as u16).to_be_bytes());
    framed.extend_from_slice(&response);
    let _ = stream.write_all(&framed).await;
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// Question name (dotted, lowercase) and the offset just past QTYPE/QCLASS.
fn parse_question(query: &[u8]) -> Option<(String, u16, usize)> {
    let mut labels = Vec::new();
    let mut pos = 12;
    loop {
        let len = *query.get(pos)? as usize;
        pos += 1;
        if len == 0 {
            break;
        }
        let label = query.get(pos..pos + len)?;
        labels.push(String::from_utf8_lossy(label).to_ascii_lowercase());
        pos += len;
    }
    let qtype = u16::from_be_bytes([*query.get(pos)?, *query.get(pos + 1)?]);
    Some((labels.join("."), qtype, pos + 4))
}

fn encode_name(name: &str, out: &mut Vec<u8>) {
    for label in name.trim_end_matches('.').split('.').filter(|l| !l.is_empty()) {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
}

fn build_response(query: &[u8], zone: &MockZone, truncate: bool) -> Vec<u8> {
    let Some((name, qtype, question_end)) = parse_question(query) else {
        return vec![];
    };
    if question_end > query.len() {
        return vec![];
    }

    let (rcode, answers): (u8, Vec<&MockAnswer>) = if zone.servfail {
        (RCODE_SERVFAIL, Vec::new())
    } else if truncate {
        (0, Vec::new())
    } else {
        match zone.records.get(&name) {
            Some(records) => (
                0,
                records.iter().filter(|r| r.record_type() == qtype).collect(),
            ),
            None => (RCODE_NXDOMAIN, Vec::new()),
        }
    };

    let mut response = Vec::with_capacity(512);
    response.extend_from_slice(&query[0..2]);
    // QR=1, RD=1, TC as requested
    response.push(0x81 | if truncate { 0x02 } else { 0x00 });
    // RA=1
    response.push(0x80 | rcode);
    response.extend_from_slice(&[0x00, 0x01]);
    response.extend_from_slice(&(answers.len() as u16).to_be_bytes());
    response.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    response.extend_from_slice(&query[12..question_end]);

    for answer in answers {
        response.extend_from_slice(&[0xc0, 0x0c]);
        response.extend_from_slice(&answer.record_type().to_be_bytes());
        response.extend_from_slice(&[0x00, 0x01]);
        response.extend_from_slice(&zone.ttl.to_be_bytes());

        let mut rdata = Vec::new();
        match answer {
            MockAnswer::A(ip) => rdata.extend_from_slice(&ip.octets()),
            MockAnswer::Srv { port, target } => {
                rdata.extend_from_slice(&1u16.to_be_bytes());
                rdata.extend_from_slice(&1u16.to_be_bytes());
                rdata.extend_from_slice(&port.to_be_bytes());
                encode_name(target, &mut rdata);
            }
        }
        response.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        response.extend_from_slice(&rdata);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_server_responds() {
        let server = MockDnsServer::start(MockZone::namenode()).await.unwrap();
        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let mut query = vec![
            0x12, 0x34, // ID
            0x01, 0x00, // Flags: recursion desired
            0x00, 0x01, // Questions: 1
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        encode_name("node0.lc.", &mut query);
        query.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);

        client.send_to(&query, server.addr()).await.unwrap();

        let mut buf = vec![0u8; 512];
        let (len, _) = client.recv_from(&mut buf).await.unwrap();

        assert!(len > 12);
        assert_eq!(buf[0..2], query[0..2], "Transaction ID should match");
        assert_eq!(buf[2] & 0x80, 0x80, "QR bit should be set");
        assert_eq!(buf[7], 1, "One answer expected");
        assert_eq!(&buf[len - 4..len], &[10, 0, 0, 1]);
        assert_eq!(server.udp_queries(), 1);

        server.shutdown();
    }

    #[test]
    fn test_unknown_name_is_nxdomain() {
        let mut query = vec![0xab, 0xcd, 0x01, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0];
        encode_name("missing.lc.", &mut query);
        query.extend_from_slice(&[0x00, 0x21, 0x00, 0x01]);

        let response = build_response(&query, &MockZone::namenode(), false);

        assert_eq!(response[0..2], [0xab, 0xcd]);
        assert_eq!(response[3] & 0x0f, RCODE_NXDOMAIN);
    }
}
