use async_trait::async_trait;
use oxiftpd::constants::TLS_ONLY_AUTH_ERROR;
use oxiftpd::core_auth::{Authenticator, ClientInfo, PassVerdict, UserVerdict};
use oxiftpd::core_tls::{TlsConfig, TlsConnection};
use oxiftpd::{FtpServer, ServerEvents, ServerOptions};
use rcgen::{BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::{
    CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer, ServerName,
};
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

struct SingleUser;

#[async_trait]
impl Authenticator for SingleUser {
    async fn check_user(&self, _client: &ClientInfo, username: &str) -> UserVerdict {
        if username == "jose" {
            UserVerdict::Accept
        } else {
            UserVerdict::Reject
        }
    }

    async fn check_pass(
        &self,
        _client: &ClientInfo,
        username: Option<&str>,
        password: &str,
    ) -> PassVerdict {
        match (username, password) {
            (Some("jose"), "esoj") => PassVerdict::accept("jose"),
            _ => PassVerdict::Reject,
        }
    }
}

struct Client<S> {
    stream: BufReader<S>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S> {
    fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
        }
    }

    async fn send(&mut self, line: &str) {
        let stream = self.stream.get_mut();
        stream.write_all(format!("{}\r\n", line).as_bytes()).await.unwrap();
        stream.flush().await.unwrap();
    }

    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.stream.read_line(&mut line).await.unwrap();
        line.trim_end().to_string()
    }

    /// Reads one reply, folding multi-line replies into one string.
    async fn reply(&mut self) -> String {
        let first = self.read_line().await;
        if first.as_bytes().get(3) != Some(&b'-') {
            return first;
        }
        let end = format!("{} ", &first[..3]);
        let mut lines = vec![first];
        loop {
            let line = self.read_line().await;
            let done = line.starts_with(&end);
            lines.push(line);
            if done {
                return lines.join("\n");
            }
        }
    }

    async fn cmd(&mut self, line: &str) -> String {
        self.send(line).await;
        self.reply().await
    }

    async fn is_closed(&mut self) -> bool {
        let mut line = String::new();
        matches!(self.stream.read_line(&mut line).await, Ok(0) | Err(_))
    }

    async fn login(&mut self) {
        assert_eq!(self.cmd("USER jose").await, "331 Password required for jose");
        assert_eq!(self.cmd("PASS esoj").await, "230 Logged on");
    }

    /// Sends PASV and returns the advertised data address.
    async fn pasv(&mut self) -> SocketAddr {
        let reply = self.cmd("PASV").await;
        assert!(reply.starts_with("227 "), "{}", reply);
        let start = reply.find('(').unwrap() + 1;
        let end = reply.find(')').unwrap();
        let fields: Vec<u16> = reply[start..end]
            .split(',')
            .map(|f| f.parse().unwrap())
            .collect();
        let host = format!("{}.{}.{}.{}", fields[0], fields[1], fields[2], fields[3]);
        format!("{}:{}", host, fields[4] * 256 + fields[5]).parse().unwrap()
    }
}

async fn start_server(options: ServerOptions) -> SocketAddr {
    serve(FtpServer::new(options, Arc::new(SingleUser))).await
}

async fn serve(server: FtpServer) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener));
    addr
}

fn rooted_at(root: &Path) -> ServerOptions {
    let root = root.to_path_buf();
    ServerOptions {
        get_root: Arc::new(move |_: &str| root.clone()),
        ..ServerOptions::default()
    }
}

async fn connect(addr: SocketAddr) -> Client<TcpStream> {
    let mut client = Client::new(TcpStream::connect(addr).await.unwrap());
    let greeting = client.reply().await;
    assert!(greeting.starts_with("220 "), "{}", greeting);
    client
}

async fn setup() -> (TempDir, Client<TcpStream>) {
    let root = tempfile::tempdir().unwrap();
    let addr = start_server(rooted_at(root.path())).await;
    let client = connect(addr).await;
    (root, client)
}

async fn read_all<S: AsyncRead + Unpin>(mut data: S) -> Vec<u8> {
    let mut buf = Vec::new();
    data.read_to_end(&mut buf).await.unwrap();
    buf
}

#[tokio::test]
async fn test_commands_require_login() {
    let (_root, mut client) = setup().await;
    assert_eq!(client.cmd("PWD").await, "530 User not logged in");
    assert_eq!(client.cmd("LIST").await, "530 User not logged in");
    assert_eq!(client.cmd("USER nobody").await, "530 Invalid username: nobody");
    assert_eq!(client.cmd("NOOP").await, "200 OK");

    client.login().await;
    assert_eq!(client.cmd("PWD").await, "257 \"/\" is current directory");
    assert_eq!(client.cmd("QUIT").await, "221 Goodbye");
    assert!(client.is_closed().await);
}

#[tokio::test]
async fn test_transfer_without_data_channel() {
    let (_root, mut client) = setup().await;
    client.login().await;
    assert_eq!(
        client.cmd("LIST").await,
        "425 Data connection not configured; send PASV or PORT"
    );
    assert_eq!(
        client.cmd("RETR data.txt").await,
        "425 Data connection not configured; send PASV or PORT"
    );
}

#[tokio::test]
async fn test_port_and_epsv_arguments() {
    let (_root, mut client) = setup().await;
    client.login().await;
    assert_eq!(client.cmd("PORT 300,0,0,1,4,1").await, "501 Bad argument to PORT");
    assert_eq!(
        client.cmd("EPSV 2").await,
        "522 Network protocol not supported, use (1)"
    );
    assert_eq!(
        client.cmd("EPRT |2|::1|2000|").await,
        "522 Server cannot handle IPv6 EPRT commands, use (1)"
    );
    assert_eq!(client.cmd("FOO").await, "202 Not recognized");
}

#[tokio::test]
async fn test_feat_without_tls() {
    let (_root, mut client) = setup().await;
    assert_eq!(client.cmd("FEAT").await, "211-Features\n SIZE\n211 end");
    assert_eq!(client.cmd("AUTH TLS").await.get(..4), Some("202 "));
}

#[tokio::test]
async fn test_list_empty_directory() {
    let (_root, mut client) = setup().await;
    client.login().await;

    let data_addr = client.pasv().await;
    client.send("LIST").await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    assert_eq!(client.reply().await, "150 Here comes the directory listing");
    assert!(read_all(data).await.is_empty());
    assert_eq!(client.reply().await, "226 Transfer OK");
}

#[tokio::test]
async fn test_list_and_nlst() {
    let (root, mut client) = setup().await;
    std::fs::write(root.path().join("data.txt"), b"hello\n").unwrap();
    std::fs::create_dir(root.path().join("esoj")).unwrap();
    client.login().await;

    let data_addr = client.pasv().await;
    client.send("LIST -la").await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    assert_eq!(client.reply().await, "150 Here comes the directory listing");
    let listing = String::from_utf8(read_all(data).await).unwrap();
    assert_eq!(client.reply().await, "226 Transfer OK");

    let lines: Vec<&str> = listing.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 2, "{}", listing);
    assert!(lines[0].starts_with('-') && lines[0].ends_with(" data.txt"), "{}", lines[0]);
    assert!(lines[1].starts_with('d') && lines[1].ends_with(" esoj"), "{}", lines[1]);

    let data_addr = client.pasv().await;
    client.send("NLST").await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    assert_eq!(client.reply().await, "150 Here comes the directory listing");
    assert_eq!(read_all(data).await, b"data.txt\r\nesoj\r\n");
    assert_eq!(client.reply().await, "226 Transfer OK");

    assert_eq!(client.cmd("CWD esoj").await, "250 CWD successful. \"/esoj\" is current directory");
    assert_eq!(client.cmd("SIZE /data.txt").await, "213 6");
}

#[tokio::test]
async fn test_list_in_active_mode() {
    let (root, mut client) = setup().await;
    std::fs::write(root.path().join("data.txt"), b"x").unwrap();
    client.login().await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let reply = client
        .cmd(&format!("PORT 127,0,0,1,{},{}", port >> 8, port & 0xff))
        .await;
    assert_eq!(reply, "200 OK");

    client.send("NLST").await;
    assert_eq!(client.reply().await, "150 Here comes the directory listing");
    let (data, _) = listener.accept().await.unwrap();
    assert_eq!(read_all(data).await, b"data.txt\r\n");
    assert_eq!(client.reply().await, "226 Transfer OK");
}

#[tokio::test]
async fn test_retr() {
    let (root, mut client) = setup().await;
    let contents: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(root.path().join("blob.bin"), &contents).unwrap();
    client.login().await;
    assert_eq!(client.cmd("TYPE I").await, "200 OK");

    let reply = client.cmd("EPSV").await;
    assert!(reply.starts_with("229 Entering Extended Passive Mode (|||"), "{}", reply);
    let port: u16 = reply
        .trim_end_matches("|)")
        .rsplit('|')
        .next()
        .unwrap()
        .parse()
        .unwrap();

    client.send("RETR blob.bin").await;
    let data = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
    assert_eq!(client.reply().await, "150 Opening BINARY mode data connection");
    assert_eq!(read_all(data).await, contents);
    assert_eq!(
        client.reply().await,
        format!("226 Closing data connection, sent {} bytes", contents.len())
    );
}

#[tokio::test]
async fn test_retr_missing_file() {
    let (_root, mut client) = setup().await;
    client.login().await;
    client.pasv().await;
    assert_eq!(client.cmd("RETR nothing.txt").await, "550 Not Found");
}

#[tokio::test]
async fn test_stor() {
    let (root, mut client) = setup().await;
    client.login().await;

    let contents: Vec<u8> = (0..100_000u32).map(|i| (i % 7) as u8).collect();
    for (name, body) in [("upload.bin", contents.as_slice()), ("empty.bin", &[][..])] {
        let data_addr = client.pasv().await;
        client.send(&format!("STOR {}", name)).await;
        let mut data = TcpStream::connect(data_addr).await.unwrap();
        assert_eq!(client.reply().await, "150 Ok to send data");
        data.write_all(body).await.unwrap();
        data.shutdown().await.unwrap();
        drop(data);
        assert_eq!(client.reply().await, "226 Closing data connection");
        assert_eq!(std::fs::read(root.path().join(name)).unwrap(), body);
    }
}

#[tokio::test]
async fn test_file_management() {
    let (root, mut client) = setup().await;
    std::fs::write(root.path().join("a.txt"), b"a").unwrap();
    client.login().await;

    assert_eq!(client.cmd("RNTO b.txt").await, "503 RNFR required first");
    assert_eq!(client.cmd("RNFR missing.txt").await, "550 File does not exist");
    assert_eq!(client.cmd("RNFR a.txt").await, "350 File exists, ready for destination name");
    assert_eq!(client.cmd("RNTO b.txt").await, "250 File renamed successfully");
    assert!(root.path().join("b.txt").exists());

    assert_eq!(client.cmd("DELE b.txt").await, "250 File deleted");
    assert_eq!(client.cmd("DELE b.txt").await, "550 File not found");

    assert_eq!(client.cmd("MKD sub").await, "257 \"/sub\" directory created");
    assert_eq!(client.cmd("RMD sub").await, "250 \"/sub\" directory removed");
    assert_eq!(client.cmd("CWD sub").await, "550 Folder not found.");
}

#[tokio::test]
async fn test_two_failed_logins_keep_connection() {
    let (_root, mut client) = setup().await;
    for _ in 0..2 {
        assert_eq!(client.cmd("USER jose").await, "331 Password required for jose");
        assert_eq!(client.cmd("PASS wrong").await, "530 Invalid password");
    }
    client.login().await;
}

#[tokio::test]
async fn test_third_failed_login_closes_connection() {
    let (_root, mut client) = setup().await;
    for _ in 0..3 {
        assert_eq!(client.cmd("USER jose").await, "331 Password required for jose");
        assert_eq!(client.cmd("PASS wrong").await, "530 Invalid password");
    }
    assert!(client.is_closed().await);
}

#[tokio::test]
async fn test_stale_passive_connection_is_not_reused() {
    let (root, mut client) = setup().await;
    std::fs::write(root.path().join("data.txt"), b"payload").unwrap();
    client.login().await;

    let first_addr = client.pasv().await;
    let _stale = TcpStream::connect(first_addr).await.unwrap();
    assert_eq!(client.cmd("RETR missing.txt").await, "550 Not Found");

    let data_addr = client.pasv().await;
    assert_eq!(data_addr, first_addr);
    client.send("RETR data.txt").await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    assert_eq!(client.reply().await, "150 Opening ASCII mode data connection");
    let received = timeout(Duration::from_secs(5), read_all(data)).await.unwrap();
    assert_eq!(received, b"payload");
    assert_eq!(client.reply().await, "226 Closing data connection, sent 7 bytes");
}

#[tokio::test]
async fn test_port_closes_passive_listener() {
    let (_root, mut client) = setup().await;
    client.login().await;

    let pasv_addr = client.pasv().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let reply = client
        .cmd(&format!("PORT 127,0,0,1,{},{}", port >> 8, port & 0xff))
        .await;
    assert_eq!(reply, "200 OK");
    assert!(TcpStream::connect(pasv_addr).await.is_err());
}

#[tokio::test]
async fn test_exhausted_port_range_replies_421() {
    let blocker = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).await.unwrap();
    let port = blocker.local_addr().unwrap().port();
    let root = tempfile::tempdir().unwrap();
    let options = ServerOptions {
        pasv_port_range: Some((port, port)),
        ..rooted_at(root.path())
    };
    let mut client = connect(start_server(options).await).await;
    client.login().await;

    assert_eq!(
        client.cmd("PASV").await,
        "421 Server was unable to open passive connection listener"
    );
    assert_eq!(
        client.cmd("NLST").await,
        "425 Data connection not configured; send PASV or PORT"
    );
}

#[tokio::test]
async fn test_root_with_wildcard_name_is_listed() {
    let parent = tempfile::tempdir().unwrap();
    let root = parent.path().join("r?ot");
    std::fs::create_dir(&root).unwrap();
    std::fs::write(root.join("inside.txt"), b"").unwrap();
    std::fs::write(parent.path().join("rxot"), b"").unwrap();
    let mut client = connect(start_server(rooted_at(&root)).await).await;
    client.login().await;

    let data_addr = client.pasv().await;
    client.send("NLST").await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    assert_eq!(client.reply().await, "150 Here comes the directory listing");
    assert_eq!(read_all(data).await, b"inside.txt\r\n");
    assert_eq!(client.reply().await, "226 Transfer OK");
}

#[tokio::test]
async fn test_retr_slurp_strategy() {
    let root = tempfile::tempdir().unwrap();
    let small = b"tiny file".to_vec();
    let large: Vec<u8> = (0..50_000u32).map(|i| (i % 13) as u8).collect();
    std::fs::write(root.path().join("small.bin"), &small).unwrap();
    std::fs::write(root.path().join("large.bin"), &large).unwrap();
    let options = ServerOptions {
        slurp_files: true,
        max_slurp_size: Some(1024),
        ..rooted_at(root.path())
    };
    let mut client = connect(start_server(options).await).await;
    client.login().await;

    for (name, contents) in [("small.bin", &small), ("large.bin", &large)] {
        let data_addr = client.pasv().await;
        client.send(&format!("RETR {}", name)).await;
        let data = TcpStream::connect(data_addr).await.unwrap();
        assert_eq!(client.reply().await, "150 Opening ASCII mode data connection");
        assert_eq!(&read_all(data).await, contents);
        assert_eq!(
            client.reply().await,
            format!("226 Closing data connection, sent {} bytes", contents.len())
        );
    }
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl Recorder {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl ServerEvents for Recorder {
    fn client_connected(&self, _peer: SocketAddr) {
        self.push("connected".to_string());
    }

    fn file_received(&self, username: &str, path: &Path) {
        let name = path.file_name().unwrap().to_string_lossy();
        self.push(format!("received {} {}", username, name));
    }

    fn file_sent(&self, username: &str, path: &Path, bytes: u64) {
        let name = path.file_name().unwrap().to_string_lossy();
        self.push(format!("sent {} {} {}", username, name, bytes));
    }
}

#[tokio::test]
async fn test_transfer_events() {
    let root = tempfile::tempdir().unwrap();
    let recorder = Arc::new(Recorder::default());
    let server = FtpServer::new(rooted_at(root.path()), Arc::new(SingleUser))
        .with_events(recorder.clone());
    let mut client = connect(serve(server).await).await;
    client.login().await;

    let data_addr = client.pasv().await;
    client.send("STOR up.txt").await;
    let mut data = TcpStream::connect(data_addr).await.unwrap();
    assert_eq!(client.reply().await, "150 Ok to send data");
    data.write_all(b"abc").await.unwrap();
    data.shutdown().await.unwrap();
    drop(data);
    assert_eq!(client.reply().await, "226 Closing data connection");

    let data_addr = client.pasv().await;
    client.send("RETR up.txt").await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    assert_eq!(client.reply().await, "150 Opening ASCII mode data connection");
    assert_eq!(read_all(data).await, b"abc");
    assert_eq!(client.reply().await, "226 Closing data connection, sent 3 bytes");
    // Replies are strictly ordered, so both hooks have run once NOOP is answered.
    assert_eq!(client.cmd("NOOP").await, "200 OK");

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(events, vec!["connected", "received jose up.txt", "sent jose up.txt 3"]);
}

struct TlsFixture {
    _dir: TempDir,
    connection: Arc<TlsConnection>,
    roots: RootCertStore,
    /// Client certificate and key signed by the CA the server trusts.
    client_identity: Option<(CertificateDer<'static>, PrivateKeyDer<'static>)>,
}

impl TlsFixture {
    fn connector(&self, present_identity: bool) -> TlsConnector {
        let builder = ClientConfig::builder().with_root_certificates(self.roots.clone());
        let config = match &self.client_identity {
            Some((cert, key)) if present_identity => builder
                .with_client_auth_cert(vec![cert.clone()], key.clone_key())
                .unwrap(),
            _ => builder.with_no_client_auth(),
        };
        TlsConnector::from(Arc::new(config))
    }
}

fn server_name() -> ServerName<'static> {
    ServerName::try_from("localhost").unwrap()
}

/// Generates a server certificate and, with `verify_clients`, a client CA.
fn tls_fixture(verify_clients: bool) -> TlsFixture {
    let dir = tempfile::tempdir().unwrap();
    let generated = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_file: PathBuf = dir.path().join("cert.pem");
    let key_file: PathBuf = dir.path().join("key.pem");
    std::fs::write(&cert_file, generated.cert.pem()).unwrap();
    std::fs::write(&key_file, generated.key_pair.serialize_pem()).unwrap();

    let mut client_ca_file = None;
    let mut client_identity = None;
    if verify_clients {
        let ca_key = KeyPair::generate().unwrap();
        let mut ca_params = CertificateParams::new(Vec::<String>::new()).unwrap();
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "oxiftpd test CA");
        let ca = ca_params.self_signed(&ca_key).unwrap();

        let client_key = KeyPair::generate().unwrap();
        let mut client_params = CertificateParams::new(vec!["client".to_string()]).unwrap();
        client_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];
        let client_cert = client_params.signed_by(&client_key, &ca, &ca_key).unwrap();

        let ca_file = dir.path().join("ca.pem");
        std::fs::write(&ca_file, ca.pem()).unwrap();
        client_ca_file = Some(ca_file);
        client_identity = Some((
            client_cert.der().clone(),
            PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(client_key.serialize_der())),
        ));
    }

    let config = TlsConfig {
        enabled: true,
        cert_file,
        key_file,
        client_ca_file,
        ..TlsConfig::default()
    };
    let mut roots = RootCertStore::empty();
    roots.add(generated.cert.der().clone()).unwrap();

    TlsFixture {
        connection: Arc::new(TlsConnection::new(&config).unwrap()),
        _dir: dir,
        roots,
        client_identity,
    }
}

/// Runs AUTH TLS on a fresh connection and returns the secured client.
async fn secure_client(
    addr: SocketAddr,
    connector: &TlsConnector,
) -> Client<TlsStream<TcpStream>> {
    let mut client = connect(addr).await;
    assert_eq!(client.cmd("AUTH TLS").await, "234 Honored");
    let tcp = client.stream.into_inner();
    Client::new(connector.connect(server_name(), tcp).await.unwrap())
}

#[tokio::test]
async fn test_auth_tls_pbsz_prot() {
    let fixture = tls_fixture(false);
    let root = tempfile::tempdir().unwrap();
    let options = ServerOptions {
        tls: Some(fixture.connection.clone()),
        tls_only: true,
        ..rooted_at(root.path())
    };
    let addr = start_server(options).await;
    let mut client = connect(addr).await;

    let feat = client.cmd("FEAT").await;
    for feature in [" AUTH TLS", " PBSZ", " PROT"] {
        assert!(feat.contains(feature), "{}", feat);
    }
    assert_eq!(client.cmd("PWD").await, "522 Protection level not sufficient; send AUTH TLS");
    assert_eq!(client.cmd("USER jose").await, TLS_ONLY_AUTH_ERROR);
    assert_eq!(client.cmd("PASS esoj").await, TLS_ONLY_AUTH_ERROR);
    assert_eq!(client.cmd("PBSZ 0").await, "503 Secure connection not established");
    assert_eq!(client.cmd("PROT P").await, "503 No PBSZ command received");
    assert_eq!(client.cmd("AUTH SSL").await, "500 Not recognized");
    assert_eq!(client.cmd("AUTH TLS").await, "234 Honored");

    let connector = fixture.connector(false);
    let tcp = client.stream.into_inner();
    let tls = connector.connect(server_name(), tcp).await.unwrap();
    let mut client = Client::new(tls);

    assert_eq!(client.cmd("AUTH TLS").await, "503 Secure connection already established");
    assert_eq!(client.cmd("PBSZ 0").await, "200 OK");
    assert_eq!(client.cmd("PROT C").await, "536 Not supported");
    assert_eq!(client.cmd("PROT E").await, "536 Not supported");
    assert_eq!(client.cmd("PROT S").await, "536 Not supported");
    assert_eq!(client.cmd("PROT X").await, "504 Not recognized");
    assert_eq!(client.cmd("PROT P").await, "200 OK");
    client.login().await;

    std::fs::write(root.path().join("secret.txt"), b"classified").unwrap();
    let data_addr = client.pasv().await;
    client.send("RETR secret.txt").await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    let data = connector.connect(server_name(), data).await.unwrap();
    assert_eq!(client.reply().await, "150 Opening ASCII mode data connection");
    assert_eq!(read_all(data).await, b"classified");
    assert_eq!(client.reply().await, "226 Closing data connection, sent 10 bytes");
}

#[tokio::test]
async fn test_silent_data_peer_times_out() {
    let fixture = tls_fixture(false);
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), b"a").unwrap();
    let options = ServerOptions {
        tls: Some(fixture.connection.clone()),
        data_timeout: Duration::from_secs(1),
        ..rooted_at(root.path())
    };
    let addr = start_server(options).await;
    let mut client = secure_client(addr, &fixture.connector(false)).await;
    client.login().await;

    let data_addr = client.pasv().await;
    client.send("RETR a.txt").await;
    // Plain TCP that never starts the TLS handshake.
    let _data = TcpStream::connect(data_addr).await.unwrap();
    assert_eq!(client.reply().await, "150 Opening ASCII mode data connection");
    let reply = timeout(Duration::from_secs(5), client.reply()).await.unwrap();
    assert_eq!(reply, "425 Can't open data connection");
    assert_eq!(client.cmd("NOOP").await, "200 OK");
}

#[tokio::test]
async fn test_unauthorized_control_peer_is_dropped() {
    let fixture = tls_fixture(true);
    let root = tempfile::tempdir().unwrap();
    let options = ServerOptions {
        tls: Some(fixture.connection.clone()),
        ..rooted_at(root.path())
    };
    let addr = start_server(options).await;

    let mut client = connect(addr).await;
    assert_eq!(client.cmd("AUTH TLS").await, "234 Honored");
    let tcp = client.stream.into_inner();
    // The handshake itself may fail or succeed before the server hangs up.
    if let Ok(tls) = fixture.connector(false).connect(server_name(), tcp).await {
        assert!(Client::new(tls).is_closed().await);
    }

    let mut client = secure_client(addr, &fixture.connector(true)).await;
    client.login().await;
}

#[tokio::test]
async fn test_unauthorized_peers_allowed() {
    let fixture = tls_fixture(true);
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), b"open").unwrap();
    let options = ServerOptions {
        tls: Some(fixture.connection.clone()),
        allow_unauthorized_tls: true,
        ..rooted_at(root.path())
    };
    let addr = start_server(options).await;
    let connector = fixture.connector(false);
    let mut client = secure_client(addr, &connector).await;
    client.login().await;

    let data_addr = client.pasv().await;
    client.send("RETR a.txt").await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    let data = connector.connect(server_name(), data).await.unwrap();
    assert_eq!(client.reply().await, "150 Opening ASCII mode data connection");
    assert_eq!(read_all(data).await, b"open");
    assert_eq!(client.reply().await, "226 Closing data connection, sent 4 bytes");
}

#[tokio::test]
async fn test_unauthorized_data_peer_is_refused() {
    let fixture = tls_fixture(true);
    let root = tempfile::tempdir().unwrap();
    std::fs::write(root.path().join("a.txt"), b"closed").unwrap();
    let options = ServerOptions {
        tls: Some(fixture.connection.clone()),
        ..rooted_at(root.path())
    };
    let addr = start_server(options).await;
    let mut client = secure_client(addr, &fixture.connector(true)).await;
    client.login().await;

    let data_addr = client.pasv().await;
    client.send("RETR a.txt").await;
    let data = TcpStream::connect(data_addr).await.unwrap();
    let _ = fixture.connector(false).connect(server_name(), data).await;
    assert_eq!(client.reply().await, "150 Opening ASCII mode data connection");
    assert_eq!(client.reply().await, "425 Can't open data connection");
    assert_eq!(
        client.cmd("RETR a.txt").await,
        "425 Data connection not configured; send PASV or PORT"
    );
}
