//! Scripted in-process FTP server for integration tests.
//!
//! Serves a single control connection on `127.0.0.1:0`, records every
//! command line it receives, hands out PASV listeners and keeps an
//! in-memory file table.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use rax_ftp_client::{ClientConfig, ConnectionDescriptor};

/// What the server observed.
#[derive(Debug, Default)]
pub struct ServerState {
    pub commands: Vec<String>,
    pub files: BTreeMap<String, Vec<u8>>,
    pub directories: Vec<String>,
    pub client_closed: bool,
}

pub struct MockServerBuilder {
    greeting: String,
    overrides: HashMap<&'static str, Vec<u8>>,
    silent: HashSet<&'static str>,
    files: BTreeMap<String, Vec<u8>>,
    direct_completion: bool,
    trickle: Option<(usize, Duration)>,
}

impl MockServerBuilder {
    pub fn greeting(mut self, greeting: &str) -> Self {
        self.greeting = greeting.to_string();
        self
    }

    /// Answer `verb` with `reply` instead of the default behaviour.
    pub fn reply(mut self, verb: &'static str, reply: &str) -> Self {
        self.overrides.insert(verb, format!("{reply}\r\n").into_bytes());
        self
    }

    /// Answer `verb` with exactly these bytes, terminator included.
    pub fn reply_bytes(mut self, verb: &'static str, reply: &[u8]) -> Self {
        self.overrides.insert(verb, reply.to_vec());
        self
    }

    /// LIST, RETR and STOR answer with a single `226`, no `150` first.
    pub fn direct_completion(mut self) -> Self {
        self.direct_completion = true;
        self
    }

    /// Send RETR/LIST data `chunk` bytes at a time, pausing `pause` between.
    pub fn trickle(mut self, chunk: usize, pause: Duration) -> Self {
        self.trickle = Some((chunk, pause));
        self
    }

    /// Never answer `verb`.
    pub fn silent(mut self, verb: &'static str) -> Self {
        self.silent.insert(verb);
        self
    }

    pub fn file(mut self, path: &str, data: &[u8]) -> Self {
        self.files.insert(path.to_string(), data.to_vec());
        self
    }

    pub async fn start(self) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(ServerState {
            files: self.files.clone(),
            ..ServerState::default()
        }));

        let script = Script {
            greeting: self.greeting,
            overrides: self.overrides,
            silent: self.silent,
            direct_completion: self.direct_completion,
            trickle: self.trickle,
        };
        let task = tokio::spawn(serve(listener, script, Arc::clone(&state)));

        MockServer { addr, state, task }
    }
}

pub struct MockServer {
    addr: SocketAddr,
    state: Arc<Mutex<ServerState>>,
    task: JoinHandle<()>,
}

impl MockServer {
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder {
            greeting: "220 Welcome to RAX FTP Server".to_string(),
            overrides: HashMap::new(),
            silent: HashSet::new(),
            files: BTreeMap::new(),
            direct_completion: false,
            trickle: None,
        }
    }

    pub async fn start() -> MockServer {
        Self::builder().start().await
    }

    pub fn descriptor(&self) -> ConnectionDescriptor {
        ConnectionDescriptor::new(self.addr.ip().to_string()).with_port(self.addr.port())
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            connect_timeout_secs: 5,
            command_timeout_secs: 5,
            data_timeout_secs: 5,
            ..ClientConfig::default()
        }
    }

    pub async fn commands(&self) -> Vec<String> {
        self.state.lock().await.commands.clone()
    }

    pub async fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().await.files.get(path).cloned()
    }

    /// Waits for the control connection to end and returns what was seen.
    pub async fn finish(self) -> ServerState {
        self.task.await.unwrap();
        Arc::try_unwrap(self.state)
            .map(Mutex::into_inner)
            .unwrap_or_default()
    }
}

struct Script {
    greeting: String,
    overrides: HashMap<&'static str, Vec<u8>>,
    silent: HashSet<&'static str>,
    direct_completion: bool,
    trickle: Option<(usize, Duration)>,
}

async fn serve(listener: TcpListener, script: Script, state: Arc<Mutex<ServerState>>) {
    let Ok((stream, _)) = listener.accept().await else {
        return;
    };
    let mut reader = BufReader::new(stream);
    if send(&mut reader, &script.greeting).await.is_err() {
        return;
    }

    let mut passive: Option<TcpListener> = None;
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => {
                state.lock().await.client_closed = true;
                return;
            }
            Ok(_) => {}
        }

        let command = line.trim_end().to_string();
        let mut parts = command.splitn(2, ' ');
        let verb = parts.next().unwrap_or("").to_ascii_uppercase();
        let arg = parts.next().unwrap_or("").to_string();
        state.lock().await.commands.push(command.clone());

        if script.silent.contains(verb.as_str()) {
            continue;
        }
        if let Some(canned) = script.overrides.get(verb.as_str()) {
            if send_raw(&mut reader, canned).await.is_err() {
                return;
            }
            continue;
        }

        let result = match verb.as_str() {
            "USER" => send(&mut reader, "331 Please specify the password.").await,
            "PASS" => send(&mut reader, "230 Login successful.").await,
            "TYPE" => send(&mut reader, "200 Switching to Binary mode.").await,
            "MODE" => send(&mut reader, "200 Mode set to S.").await,
            "STRU" => send(&mut reader, "200 Structure set to F.").await,
            "PASV" => {
                let data_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
                let port = data_listener.local_addr().unwrap().port();
                passive = Some(data_listener);
                let reply = format!(
                    "227 Entering Passive Mode (127,0,0,1,{},{}).",
                    port >> 8,
                    port & 0xff
                );
                send(&mut reader, &reply).await
            }
            "LIST" => {
                let listing = {
                    let state = state.lock().await;
                    let mut listing = String::new();
                    for dir in &state.directories {
                        listing.push_str(&format!("drwxr-xr-x 2 ftp ftp 0 Jan 01 00:00 {dir}\r\n"));
                    }
                    for (name, data) in &state.files {
                        listing.push_str(&format!(
                            "-rw-r--r-- 1 ftp ftp {} Jan 01 00:00 {}\r\n",
                            data.len(),
                            name
                        ));
                    }
                    listing
                };
                send_data(&mut reader, &mut passive, &script, listing.as_bytes(), "Directory send OK.")
                    .await
            }
            "RETR" => {
                let data = state.lock().await.files.get(&arg).cloned();
                match data {
                    Some(data) => {
                        send_data(&mut reader, &mut passive, &script, &data, "Transfer complete.")
                            .await
                    }
                    None => {
                        passive = None;
                        send(&mut reader, "550 Failed to open file.").await
                    }
                }
            }
            "STOR" => match accept_data(&mut passive).await {
                Some(mut data_stream) => {
                    let opening = if script.direct_completion {
                        "226 Transfer complete."
                    } else {
                        "150 Ok to send data."
                    };
                    let _ = send(&mut reader, opening).await;
                    let mut data = Vec::new();
                    let _ = data_stream.read_to_end(&mut data).await;
                    drop(data_stream);
                    state.lock().await.files.insert(arg.clone(), data);
                    if script.direct_completion {
                        Ok(())
                    } else {
                        send(&mut reader, "226 Transfer complete.").await
                    }
                }
                None => send(&mut reader, "425 Use PASV first.").await,
            },
            "DELE" => {
                let removed = state.lock().await.files.remove(&arg).is_some();
                if removed {
                    send(&mut reader, "250 Delete operation successful.").await
                } else {
                    send(&mut reader, "550 Delete operation failed.").await
                }
            }
            "MKD" => {
                state.lock().await.directories.push(arg.clone());
                send(&mut reader, &format!("257 \"{arg}\" created")).await
            }
            "RMD" => {
                let mut state = state.lock().await;
                let before = state.directories.len();
                state.directories.retain(|d| d != &arg);
                let removed = state.directories.len() != before;
                drop(state);
                if removed {
                    send(&mut reader, "250 Remove directory operation successful.").await
                } else {
                    send(&mut reader, "550 Remove directory operation failed.").await
                }
            }
            "QUIT" => {
                let _ = send(&mut reader, "221 Goodbye.").await;
                return;
            }
            _ => send(&mut reader, "502 Command not implemented.").await,
        };

        if result.is_err() {
            return;
        }
    }
}

async fn send(reader: &mut BufReader<TcpStream>, reply: &str) -> std::io::Result<()> {
    let stream = reader.get_mut();
    stream.write_all(reply.as_bytes()).await?;
    stream.write_all(b"\r\n").await?;
    stream.flush().await
}

async fn send_raw(reader: &mut BufReader<TcpStream>, bytes: &[u8]) -> std::io::Result<()> {
    let stream = reader.get_mut();
    stream.write_all(bytes).await?;
    stream.flush().await
}

async fn accept_data(passive: &mut Option<TcpListener>) -> Option<TcpStream> {
    let listener = passive.take()?;
    listener.accept().await.ok().map(|(stream, _)| stream)
}

async fn send_data(
    reader: &mut BufReader<TcpStream>,
    passive: &mut Option<TcpListener>,
    script: &Script,
    data: &[u8],
    done: &str,
) -> std::io::Result<()> {
    let Some(mut data_stream) = accept_data(passive).await else {
        return send(reader, "425 Use PASV first.").await;
    };
    if !script.direct_completion {
        send(reader, "150 Opening BINARY mode data connection.").await?;
    }
    match script.trickle {
        Some((chunk, pause)) => {
            for part in data.chunks(chunk) {
                data_stream.write_all(part).await?;
                data_stream.flush().await?;
                tokio::time::sleep(pause).await;
            }
        }
        None => data_stream.write_all(data).await?,
    }
    data_stream.shutdown().await?;
    drop(data_stream);
    send(reader, &format!("226 {done}")).await
}
