//! Connection bookkeeping for the server loop
//!
//! Tracks which player each WebSocket connection controls, owns the outbound
//! queue of every connection and enforces the connection limit. Sends never
//! block the simulation: a full or closed queue drops the frame.

use log::{info, warn};
use shared::Inventory;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_tungstenite::tungstenite::Message;

/// Outbound frames buffered per connection before new ones are dropped
pub const OUTBOUND_QUEUE_LEN: usize = 256;

/// A live connection and the player it controls
#[derive(Debug)]
pub struct Client {
    /// Connection id handed out by the accept loop
    pub id: u32,
    pub player_id: u32,
    pub connected_at: Instant,
    /// Last inventory sent to this client, used to skip unchanged updates
    pub last_inventory: Option<Inventory>,
    sender: mpsc::Sender<Message>,
}

impl Client {
    pub fn new(id: u32, player_id: u32, sender: mpsc::Sender<Message>) -> Self {
        Self {
            id,
            player_id,
            connected_at: Instant::now(),
            last_inventory: None,
            sender,
        }
    }

    /// Queues a frame for the writer task. Returns false if it was dropped.
    pub fn send(&self, message: Message) -> bool {
        match self.sender.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue full for client {}, dropping frame", self.id);
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn connected_for(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

pub struct ClientManager {
    clients: BTreeMap<u32, Client>,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: BTreeMap::new(),
            max_clients,
        }
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    /// Registers a connection. Fails when the server is at capacity or the
    /// connection id is already in use.
    pub fn add_client(&mut self, client_id: u32, player_id: u32, sender: mpsc::Sender<Message>) -> bool {
        if self.is_full() || self.clients.contains_key(&client_id) {
            return false;
        }

        info!("Client {} connected as player {}", client_id, player_id);
        self.clients
            .insert(client_id, Client::new(client_id, player_id, sender));
        true
    }

    /// Forgets a connection and returns the player it controlled.
    pub fn remove_client(&mut self, client_id: u32) -> Option<u32> {
        let client = self.clients.remove(&client_id)?;
        info!(
            "Client {} disconnected after {:.1}s",
            client.id,
            client.connected_for().as_secs_f32()
        );
        Some(client.player_id)
    }

    pub fn player_id(&self, client_id: u32) -> Option<u32> {
        self.clients.get(&client_id).map(|client| client.player_id)
    }

    pub fn send_to(&self, client_id: u32, message: Message) -> bool {
        self.clients
            .get(&client_id)
            .is_some_and(|client| client.send(message))
    }

    /// Queues `data` as a binary frame on every connection. Returns how many
    /// queues accepted it.
    pub fn broadcast(&self, data: &[u8]) -> usize {
        self.clients
            .values()
            .filter(|client| client.send(Message::binary(data.to_vec())))
            .count()
    }

    /// Records `inventory` as the latest for this connection and reports
    /// whether it differs from the previous one.
    pub fn inventory_changed(&mut self, client_id: u32, inventory: Inventory) -> bool {
        let Some(client) = self.clients.get_mut(&client_id) else {
            return false;
        };
        if client.last_inventory == Some(inventory) {
            return false;
        }
        client.last_inventory = Some(inventory);
        true
    }

    /// `(connection id, player id)` for every connection, in connection order.
    pub fn players(&self) -> Vec<(u32, u32)> {
        self.clients
            .values()
            .map(|client| (client.id, client.player_id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (mpsc::Sender<Message>, mpsc::Receiver<Message>) {
        mpsc::channel(4)
    }

    #[test]
    fn test_client_manager_creation() {
        let manager = ClientManager::new(4);
        assert!(manager.is_empty());
        assert!(!manager.is_full());
    }

    #[test]
    fn test_add_client() {
        let mut manager = ClientManager::new(4);
        let (tx, _rx) = channel();

        assert!(manager.add_client(1, 10, tx));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.player_id(1), Some(10));
        assert_eq!(manager.player_id(2), None);
    }

    #[test]
    fn test_add_client_max_capacity() {
        let mut manager = ClientManager::new(2);
        let (tx, _rx) = channel();

        assert!(manager.add_client(1, 1, tx.clone()));
        assert!(manager.add_client(2, 2, tx.clone()));
        assert!(manager.is_full());
        assert!(!manager.add_client(3, 3, tx.clone()));

        manager.remove_client(1);
        assert!(manager.add_client(3, 3, tx));
    }

    #[test]
    fn test_duplicate_connection_id_rejected() {
        let mut manager = ClientManager::new(4);
        let (tx, _rx) = channel();

        assert!(manager.add_client(1, 1, tx.clone()));
        assert!(!manager.add_client(1, 2, tx));
        assert_eq!(manager.player_id(1), Some(1));
    }

    #[test]
    fn test_remove_client() {
        let mut manager = ClientManager::new(4);
        let (tx, _rx) = channel();
        manager.add_client(7, 3, tx);

        assert_eq!(manager.remove_client(7), Some(3));
        assert_eq!(manager.remove_client(7), None);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_removed_client_queue_is_closed() {
        let mut manager = ClientManager::new(4);
        let (tx, mut rx) = channel();
        manager.add_client(1, 1, tx);
        manager.send_to(1, Message::binary(vec![3]));

        manager.remove_client(1);

        // Queued frames still drain, then the writer sees the end
        assert_eq!(tokio_test::block_on(rx.recv()), Some(Message::binary(vec![3])));
        assert_eq!(tokio_test::block_on(rx.recv()), None);
    }

    #[test]
    fn test_send_and_broadcast() {
        let mut manager = ClientManager::new(4);
        let (tx1, mut rx1) = channel();
        let (tx2, mut rx2) = channel();
        manager.add_client(1, 1, tx1);
        manager.add_client(2, 2, tx2);

        assert!(manager.send_to(1, Message::binary(vec![1])));
        assert!(!manager.send_to(9, Message::binary(vec![1])));
        assert_eq!(manager.broadcast(&[7, 7]), 2);

        assert_eq!(rx1.try_recv().unwrap(), Message::binary(vec![1]));
        assert_eq!(rx1.try_recv().unwrap(), Message::binary(vec![7, 7]));
        assert_eq!(rx2.try_recv().unwrap(), Message::binary(vec![7, 7]));
        assert!(rx2.try_recv().is_err());
    }

    #[test]
    fn test_full_or_closed_queue_drops_frames() {
        let mut manager = ClientManager::new(4);
        let (tx, rx) = mpsc::channel(1);
        let (closed_tx, closed_rx) = channel();
        drop(closed_rx);
        manager.add_client(1, 1, tx);
        manager.add_client(2, 2, closed_tx);

        assert_eq!(manager.broadcast(&[1]), 1);
        assert_eq!(manager.broadcast(&[2]), 0);
        drop(rx);
    }

    #[test]
    fn test_inventory_changed() {
        let mut manager = ClientManager::new(4);
        let (tx, _rx) = channel();
        manager.add_client(1, 1, tx);

        assert!(manager.inventory_changed(1, Inventory::default()));
        assert!(!manager.inventory_changed(1, Inventory::default()));
        assert!(manager.inventory_changed(1, Inventory::new(1, 0, 0)));
        assert!(!manager.inventory_changed(2, Inventory::new(1, 0, 0)));
    }

    #[test]
    fn test_players_in_connection_order() {
        let mut manager = ClientManager::new(4);
        let (tx, _rx) = channel();
        manager.add_client(5, 50, tx.clone());
        manager.add_client(2, 20, tx);

        assert_eq!(manager.players(), vec![(2, 20), (5, 50)]);
    }
}
