//! Room membership and fan-out.
//!
//! The relay keeps no canvas state. It only knows who is in which room and
//! forwards cursor updates between them.

use dashmap::DashMap;
use std::collections::HashMap;
use thumbboard_core::presence::{ClientMessage, ServerMessage, UserInfo};
use tokio::sync::broadcast;
use tracing::{debug, info};

pub const CHANNEL_CAPACITY: usize = 256;

/// A message together with the peer that caused it.
pub type Envelope = (String, ServerMessage);

struct Room {
    tx: broadcast::Sender<Envelope>,
    peers: HashMap<String, UserInfo>,
}

impl Room {
    fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            peers: HashMap::new(),
        }
    }
}

/// What a newcomer learns on joining.
pub struct Membership {
    pub rx: broadcast::Receiver<Envelope>,
    pub peer_count: usize,
    /// Peers already in the room, excluding the newcomer.
    pub others: Vec<(String, UserInfo)>,
}

pub struct RoomRegistry {
    rooms: DashMap<String, Room>,
    capacity: usize,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(CHANNEL_CAPACITY)
    }
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            capacity,
        }
    }

    pub fn join(&self, room_id: &str, peer_id: &str, user: UserInfo) -> Membership {
        let mut room = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(self.capacity));
        let mut others: Vec<_> = room
            .peers
            .iter()
            .map(|(id, user)| (id.clone(), user.clone()))
            .collect();
        others.sort_by(|a, b| a.0.cmp(&b.0));
        room.peers.insert(peer_id.to_string(), user);
        Membership {
            rx: room.tx.subscribe(),
            peer_count: room.peers.len(),
            others,
        }
    }

    /// Remove a peer. Empty rooms are dropped. Returns `true` if the peer was present.
    pub fn leave(&self, room_id: &str, peer_id: &str) -> bool {
        let removed = match self.rooms.get_mut(room_id) {
            Some(mut room) => room.peers.remove(peer_id).is_some(),
            None => return false,
        };
        // Re-checked under the shard lock: a join may have landed since.
        if self
            .rooms
            .remove_if(room_id, |_, room| room.peers.is_empty())
            .is_some()
        {
            debug!("Room {} closed", room_id);
        }
        removed
    }

    pub fn broadcast(&self, room_id: &str, from: &str, message: ServerMessage) {
        if let Some(room) = self.rooms.get(room_id) {
            // No receivers is fine: the sender may be alone.
            let _ = room.tx.send((from.to_string(), message));
        }
    }

    pub fn peer_count(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map_or(0, |room| room.peers.len())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

/// Room membership of one connected socket.
pub struct Peer {
    id: String,
    room: Option<String>,
    user: Option<UserInfo>,
    rx: Option<broadcast::Receiver<Envelope>>,
}

impl Peer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            room: None,
            user: None,
            rx: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub fn receiver_mut(&mut self) -> Option<&mut broadcast::Receiver<Envelope>> {
        self.rx.as_mut()
    }

    /// Apply a client message. Returns the replies for this socket only.
    pub fn handle(&mut self, registry: &RoomRegistry, message: ClientMessage) -> Vec<ServerMessage> {
        match message {
            ClientMessage::Join { room, user } => {
                if room.trim().is_empty() {
                    return vec![error("Room id must not be empty")];
                }
                self.leave(registry);
                let membership = registry.join(&room, &self.id, user.clone());
                registry.broadcast(
                    &room,
                    &self.id,
                    ServerMessage::PeerJoined {
                        user_id: self.id.clone(),
                        user: user.clone(),
                    },
                );
                info!("Peer {} joined room {} ({} peers)", self.id, room, membership.peer_count);

                let mut replies = vec![ServerMessage::Joined {
                    room: room.clone(),
                    user_id: self.id.clone(),
                    peer_count: membership.peer_count,
                }];
                replies.extend(
                    membership
                        .others
                        .into_iter()
                        .map(|(user_id, user)| ServerMessage::PeerJoined { user_id, user }),
                );
                self.rx = Some(membership.rx);
                self.room = Some(room);
                self.user = Some(user);
                replies
            }
            ClientMessage::Leave => {
                self.leave(registry);
                Vec::new()
            }
            ClientMessage::Cursor { x, y } => match (&self.room, &self.user) {
                (Some(room), Some(user)) => {
                    registry.broadcast(
                        room,
                        &self.id,
                        ServerMessage::Cursor {
                            user_id: self.id.clone(),
                            x,
                            y,
                            name: user.name.clone(),
                            color: user.color.clone(),
                        },
                    );
                    Vec::new()
                }
                _ => vec![error("Join a room before sending cursors")],
            },
        }
    }

    /// Leave the current room, if any, and tell the others.
    pub fn leave(&mut self, registry: &RoomRegistry) {
        self.rx = None;
        self.user = None;
        if let Some(room) = self.room.take() {
            registry.leave(&room, &self.id);
            registry.broadcast(
                &room,
                &self.id,
                ServerMessage::PeerLeft {
                    user_id: self.id.clone(),
                },
            );
            info!(
                "Peer {} left room {} ({} remaining)",
                self.id,
                room,
                registry.peer_count(&room)
            );
        }
    }

    /// Filter a room broadcast for this socket. Own messages are not echoed.
    pub fn forward(&self, envelope: Envelope) -> Option<ServerMessage> {
        let (from, message) = envelope;
        (from != self.id).then_some(message)
    }
}

pub fn error(message: &str) -> ServerMessage {
    ServerMessage::Error {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserInfo {
        UserInfo {
            name: name.to_string(),
            color: "#3366ff".to_string(),
        }
    }

    fn join(peer: &mut Peer, registry: &RoomRegistry, room: &str) -> Vec<ServerMessage> {
        let name = peer.id().to_string();
        peer.handle(
            registry,
            ClientMessage::Join {
                room: room.to_string(),
                user: user(&name),
            },
        )
    }

    fn drain(peer: &mut Peer) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Some(Ok(envelope)) = peer.receiver_mut().map(|rx| rx.try_recv()) {
            if let Some(message) = peer.forward(envelope) {
                out.push(message);
            }
        }
        out
    }

    #[test]
    fn test_join_reports_existing_peers() {
        let registry = RoomRegistry::default();
        let mut ana = Peer::new("ana");
        let mut ben = Peer::new("ben");

        let replies = join(&mut ana, &registry, "r1");
        assert_eq!(
            replies,
            vec![ServerMessage::Joined {
                room: "r1".into(),
                user_id: "ana".into(),
                peer_count: 1
            }]
        );

        let replies = join(&mut ben, &registry, "r1");
        assert_eq!(replies.len(), 2);
        assert!(matches!(&replies[0], ServerMessage::Joined { peer_count: 2, .. }));
        assert!(matches!(&replies[1], ServerMessage::PeerJoined { user_id, .. } if user_id == "ana"));

        let seen = drain(&mut ana);
        assert!(matches!(&seen[..], [ServerMessage::PeerJoined { user_id, .. }] if user_id == "ben"));
    }

    #[test]
    fn test_cursor_fans_out_without_echo() {
        let registry = RoomRegistry::default();
        let mut ana = Peer::new("ana");
        let mut ben = Peer::new("ben");
        join(&mut ana, &registry, "r1");
        join(&mut ben, &registry, "r1");
        drain(&mut ana);
        drain(&mut ben);

        assert!(ana.handle(&registry, ClientMessage::Cursor { x: 4.0, y: 2.0 }).is_empty());
        assert!(drain(&mut ana).is_empty());
        assert_eq!(
            drain(&mut ben),
            vec![ServerMessage::Cursor {
                user_id: "ana".into(),
                x: 4.0,
                y: 2.0,
                name: "ana".into(),
                color: "#3366ff".into(),
            }]
        );
    }

    #[test]
    fn test_cursor_before_join_is_an_error() {
        let registry = RoomRegistry::default();
        let mut ana = Peer::new("ana");
        let replies = ana.handle(&registry, ClientMessage::Cursor { x: 0.0, y: 0.0 });
        assert!(matches!(&replies[..], [ServerMessage::Error { .. }]));
        assert!(matches!(
            &join(&mut ana, &registry, "  ")[..],
            [ServerMessage::Error { .. }]
        ));
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn test_occupied_room_survives_leave() {
        let registry = RoomRegistry::default();
        registry.join("r1", "ana", user("ana"));
        let membership = registry.join("r1", "ben", user("ben"));
        assert_eq!(membership.peer_count, 2);

        assert!(registry.leave("r1", "ana"));
        assert!(!registry.leave("r1", "ana"));
        assert_eq!(registry.room_count(), 1);
        assert_eq!(registry.peer_count("r1"), 1);

        assert!(registry.leave("r1", "ben"));
        assert_eq!(registry.room_count(), 0);
        assert!(!registry.leave("r1", "ben"));
    }

    #[test]
    fn test_concurrent_join_and_leave_keep_rooms_consistent() {
        use std::sync::Arc;

        let registry = Arc::new(RoomRegistry::default());
        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let id = format!("peer-{worker}");
                    for _ in 0..500 {
                        let _membership = registry.join("busy", &id, user(&id));
                        assert!(registry.peer_count("busy") >= 1);
                        assert!(registry.leave("busy", &id));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(registry.room_count(), 0);

        // A room that is still listed always has its members.
        let mut membership = registry.join("busy", "ana", user("ana"));
        registry.broadcast("busy", "ben", error("ping"));
        assert!(membership.rx.try_recv().is_ok());
    }

    #[test]
    fn test_leave_and_switch_rooms() {
        let registry = RoomRegistry::default();
        let mut ana = Peer::new("ana");
        let mut ben = Peer::new("ben");
        join(&mut ana, &registry, "r1");
        join(&mut ben, &registry, "r1");
        drain(&mut ben);

        join(&mut ana, &registry, "r2");
        assert_eq!(ana.room(), Some("r2"));
        assert_eq!(registry.peer_count("r1"), 1);
        assert_eq!(registry.peer_count("r2"), 1);
        assert_eq!(
            drain(&mut ben),
            vec![ServerMessage::PeerLeft { user_id: "ana".into() }]
        );

        ben.handle(&registry, ClientMessage::Leave);
        ana.leave(&registry);
        assert_eq!(registry.room_count(), 0);
        assert!(ben.room().is_none());
    }
}
