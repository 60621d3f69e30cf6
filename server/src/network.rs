//! Server network layer handling WebSocket connections and game loop coordination

use crate::client_manager::{ClientManager, OUTBOUND_QUEUE_LEN};
use crate::config::ServerConfig;
use crate::game::GameState;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientMessage, Frame, PacketCodec, ServerMessage};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Longest simulation step taken after a stall, in seconds
pub const MAX_TICK_DELTA: f32 = 0.25;

/// Events sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum NetworkEvent {
    ClientConnected {
        client_id: u32,
        sender: mpsc::Sender<Message>,
    },
    MessageReceived {
        client_id: u32,
        message: ClientMessage,
    },
    ClientDisconnected {
        client_id: u32,
    },
    Shutdown,
}

/// Main server coordinating networking and game simulation
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    clients: ClientManager,
    game_state: GameState,
    codec: PacketCodec,
    tick_duration: Duration,

    event_tx: mpsc::UnboundedSender<NetworkEvent>,
    event_rx: mpsc::UnboundedReceiver<NetworkEvent>,
}

impl Server {
    pub async fn new(config: &ServerConfig) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(config.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            clients: ClientManager::new(config.max_clients),
            game_state: GameState::new(config.world_config()),
            codec: PacketCodec::new(config.max_packet_bytes),
            tick_duration: config.tick_duration(),
            event_tx,
            event_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    /// Sender that can feed events into the loop, including `Shutdown`.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<NetworkEvent> {
        self.event_tx.clone()
    }

    /// Spawns task that accepts connections and hands each its own tasks
    fn spawn_acceptor(&mut self) -> Result<(), ServerError> {
        let listener = self
            .listener
            .take()
            .ok_or("server is already running")?;
        let event_tx = self.event_tx.clone();
        let codec = self.codec;
        let next_client_id = Arc::new(AtomicU32::new(1));

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        let client_id = next_client_id.fetch_add(1, Ordering::Relaxed);
                        let event_tx = event_tx.clone();
                        tokio::spawn(async move {
                            handle_connection(stream, addr, client_id, codec, event_tx).await;
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
        Ok(())
    }

    fn send_message(&self, client_id: u32, message: &ServerMessage) {
        match message.encode(&self.codec) {
            Ok(data) => {
                self.clients.send_to(client_id, Message::binary(data));
            }
            Err(e) => error!("Failed to encode {} for client {}: {}", message.kind(), client_id, e),
        }
    }

    /// Applies one event from a connection task to the world
    pub fn handle_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::ClientConnected { client_id, sender } => {
                if self.clients.is_full() {
                    // Dropping the sender ends the writer task, which closes the socket
                    warn!("Server full, refusing client {}", client_id);
                    return;
                }

                let player_id = self.game_state.add_player();
                if !self.clients.add_client(client_id, player_id, sender) {
                    self.game_state.remove_player(player_id);
                    return;
                }
                self.send_message(client_id, &ServerMessage::Init { id: player_id });
            }

            NetworkEvent::MessageReceived { client_id, message } => {
                if let Some(player_id) = self.clients.player_id(client_id) {
                    self.game_state.handle_message(player_id, message);
                }
            }

            NetworkEvent::ClientDisconnected { client_id } => {
                if let Some(player_id) = self.clients.remove_client(client_id) {
                    self.game_state.remove_player(player_id);
                }
            }

            NetworkEvent::Shutdown => {}
        }
    }

    /// Advances the world by `dt` and sends the resulting updates
    pub fn step(&mut self, dt: f32) -> Result<(), ServerError> {
        self.game_state.tick(dt);
        self.broadcast_game_state()?;
        self.send_inventories();
        Ok(())
    }

    /// Broadcasts current world snapshot to all connected clients
    fn broadcast_game_state(&mut self) -> Result<(), ServerError> {
        if self.clients.is_empty() {
            return Ok(());
        }

        let data = ServerMessage::State(self.game_state.snapshot()).encode(&self.codec)?;
        self.clients.broadcast(&data);
        Ok(())
    }

    /// Sends each player their inventory when it changed since the last send
    fn send_inventories(&mut self) {
        for (client_id, player_id) in self.clients.players() {
            let Some(inventory) = self.game_state.player(player_id).map(|p| p.inventory) else {
                continue;
            };
            if self.clients.inventory_changed(client_id, inventory) {
                self.send_message(client_id, &ServerMessage::Inventory(inventory));
            }
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), ServerError> {
        self.spawn_acceptor()?;

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                // Handle network events
                event = self.event_rx.recv() => {
                    match event {
                        Some(NetworkEvent::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                        Some(event) => self.handle_event(event),
                    }
                },

                // Handle server tick events
                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let mut dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    if dt > MAX_TICK_DELTA {
                        warn!("Tick took {:.3}s, capping to {:.3}s", dt, MAX_TICK_DELTA);
                        dt = MAX_TICK_DELTA;
                    }

                    self.step(dt)?;

                    // Periodic performance monitoring
                    if self.game_state.tick % 60 == 0 && !self.clients.is_empty() {
                        debug!(
                            "Tick {}: {} clients, {} mobs, {} resources, {} structures, {:.1}Hz",
                            self.game_state.tick,
                            self.clients.len(),
                            self.game_state.mob_count(),
                            self.game_state.resource_count(),
                            self.game_state.structure_count(),
                            1.0 / dt.max(f32::EPSILON)
                        );
                    }
                },
            }
        }

        Ok(())
    }
}

/// Transport limits matching the codec budget, so oversized messages are
/// refused before they are buffered.
fn websocket_config(codec: &PacketCodec) -> WebSocketConfig {
    let mut config = WebSocketConfig::default();
    config.max_message_size = Some(codec.max_bytes());
    config.max_frame_size = Some(codec.max_bytes());
    config
}

/// Runs one connection: WebSocket handshake, then a reader loop here and a
/// writer task draining the outbound queue.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    client_id: u32,
    codec: PacketCodec,
    event_tx: mpsc::UnboundedSender<NetworkEvent>,
) {
    let limits = websocket_config(&codec);
    let ws = match tokio_tungstenite::accept_async_with_config(stream, Some(limits)).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };
    debug!("Client {} opened WebSocket from {}", client_id, addr);

    let (mut sink, mut frames) = ws.split();
    let (sender, mut outbound) = mpsc::channel::<Message>(OUTBOUND_QUEUE_LEN);
    if event_tx
        .send(NetworkEvent::ClientConnected { client_id, sender })
        .is_err()
    {
        return;
    }

    tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            if sink.send(message).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = frames.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                debug!("Client {} read error: {}", client_id, e);
                break;
            }
        };

        let decoded = match &frame {
            Message::Binary(data) => codec.decode(Frame::Binary(data)),
            Message::Text(text) => codec.decode(Frame::Text(text)),
            Message::Close(_) => break,
            _ => continue,
        };

        let packet = match decoded {
            Ok(packet) => packet,
            Err(e) => {
                warn!("Closing client {}: {}", client_id, e);
                break;
            }
        };

        match ClientMessage::try_from(packet) {
            Ok(message) => {
                if event_tx
                    .send(NetworkEvent::MessageReceived { client_id, message })
                    .is_err()
                {
                    break;
                }
            }
            Err(e) => debug!("Dropping message from client {}: {}", client_id, e),
        }
    }

    let _ = event_tx.send(NetworkEvent::ClientDisconnected { client_id });
}
