//! Room membership and message forwarding
//!
//! Rooms live in a `DashMap` and are only mutated through their entry guard,
//! which serializes join, leave and relay per room. The connection index is a
//! second map; a guard on it is never held while a room guard is acquired.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::json;

use super::connection::Connection;
use super::types::{
    ConnectionId, PeerId, RelayError, RelayResult, RoomSnapshot, MAX_OCCUPANTS,
    POLICY_VIOLATION,
};
use crate::eventlog::{EventLog, LogContext};
use crate::metrics;
use crate::protocol::{ClientMessage, ServerMessage};

#[derive(Debug)]
struct Occupant {
    peer_id: PeerId,
    connection: Connection,
}

#[derive(Debug, Default)]
struct Room {
    occupants: Vec<Occupant>,
}

impl Room {
    fn peers(&self) -> Vec<PeerId> {
        self.occupants.iter().map(|o| o.peer_id.clone()).collect()
    }
}

#[derive(Debug, Clone)]
struct Membership {
    room_id: String,
    peer_id: PeerId,
}

pub struct RoomManager {
    rooms: DashMap<String, Room>,
    memberships: DashMap<ConnectionId, Membership>,
    log: EventLog,
}

impl RoomManager {
    pub fn new(log: EventLog) -> Self {
        Self {
            rooms: DashMap::new(),
            memberships: DashMap::new(),
            log,
        }
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    /// Put a connection into a room and announce it.
    ///
    /// The joiner receives `joined` with every occupant (itself included), the
    /// other occupant receives `peer-joined`. A full room answers `room-full`,
    /// closes the connection with a policy-violation status and changes
    /// nothing, not even the joiner's current room. A connection already in a
    /// different room leaves it once the new slot is taken; joining the room it
    /// is already in re-sends `joined` with the same peer id.
    pub fn join(&self, connection: &Connection, room_id: &str) -> RelayResult<PeerId> {
        if room_id.trim().is_empty() {
            return Err(RelayError::InvalidRoomId(room_id.to_string()));
        }

        let previous = self.membership(connection.id());
        if let Some(current) = &previous {
            if current.room_id == room_id {
                let peers = self.room(room_id).map(|r| r.peers).unwrap_or_default();
                connection.send(ServerMessage::Joined {
                    peer_id: current.peer_id.clone(),
                    peers,
                });
                return Ok(current.peer_id.clone());
            }
        }

        let peer_id = PeerId::generate();
        let mut room = self.rooms.entry(room_id.to_string()).or_default();

        if room.occupants.len() >= MAX_OCCUPANTS {
            drop(room);
            connection.send(ServerMessage::RoomFull);
            connection.close(POLICY_VIOLATION, "room full");
            self.log
                .warn(LogContext::new("room-full").room(room_id).peer("n/a"));
            metrics::record_room_full();
            return Err(RelayError::RoomFull(room_id.to_string()));
        }

        room.occupants.push(Occupant {
            peer_id: peer_id.clone(),
            connection: connection.clone(),
        });
        connection.send(ServerMessage::Joined {
            peer_id: peer_id.clone(),
            peers: room.peers(),
        });
        for other in room.occupants.iter().filter(|o| o.peer_id != peer_id) {
            other.connection.send(ServerMessage::PeerJoined {
                peer_id: peer_id.clone(),
            });
        }
        drop(room);

        // The old room is only left once the new slot is secured
        if previous.is_some() {
            self.leave(connection, "rejoin");
        }
        self.memberships.insert(
            connection.id(),
            Membership {
                room_id: room_id.to_string(),
                peer_id: peer_id.clone(),
            },
        );

        self.log
            .info(LogContext::new("peer-join").room(room_id).peer(&peer_id));
        metrics::set_active_rooms(self.rooms.len());

        Ok(peer_id)
    }

    /// Remove a connection from its room, telling the remaining occupant.
    ///
    /// Returns false when the connection was in no room, so calling it again
    /// after a close is harmless.
    pub fn leave(&self, connection: &Connection, reason: &str) -> bool {
        let Some((_, membership)) = self.memberships.remove(&connection.id()) else {
            return false;
        };

        if let Entry::Occupied(mut entry) = self.rooms.entry(membership.room_id.clone()) {
            let room = entry.get_mut();
            room.occupants.retain(|o| o.peer_id != membership.peer_id);
            for other in &room.occupants {
                other.connection.send(ServerMessage::PeerLeft {
                    peer_id: membership.peer_id.clone(),
                });
            }
            if room.occupants.is_empty() {
                entry.remove();
            }
        }

        self.log.info(
            LogContext::new("peer-leave")
                .room(&membership.room_id)
                .peer(&membership.peer_id)
                .detail(json!({ "reason": reason })),
        );
        metrics::set_active_rooms(self.rooms.len());
        true
    }

    /// Forward a message from `connection` to every other open occupant of its
    /// room, tagged with the sender's peer id. Returns the number of
    /// deliveries; a sender without a room is dropped silently.
    pub fn relay(&self, connection: &Connection, message: ClientMessage) -> usize {
        let Some(membership) = self.membership(connection.id()) else {
            tracing::trace!(connection = %connection.id(), kind = message.kind(), "relay without room dropped");
            return 0;
        };

        let kind = message.kind();
        let detail = message.log_detail();
        let Some(outbound) = message.relayed(membership.peer_id.clone()) else {
            return 0;
        };

        let delivered = match self.rooms.get(&membership.room_id) {
            Some(room) => room
                .occupants
                .iter()
                .filter(|o| o.peer_id != membership.peer_id && o.connection.is_open())
                .filter(|o| o.connection.send(outbound.clone()))
                .count(),
            None => 0,
        };

        self.log.info(
            LogContext::new(format!("relay:{kind}"))
                .room(&membership.room_id)
                .peer(&membership.peer_id)
                .detail(detail),
        );
        metrics::record_message_relayed(kind);

        delivered
    }

    pub fn peer_id(&self, connection: ConnectionId) -> Option<PeerId> {
        self.membership(connection).map(|m| m.peer_id)
    }

    pub fn room_of(&self, connection: ConnectionId) -> Option<String> {
        self.membership(connection).map(|m| m.room_id)
    }

    pub fn room(&self, room_id: &str) -> Option<RoomSnapshot> {
        self.rooms.get(room_id).map(|room| RoomSnapshot {
            room_id: room_id.to_string(),
            peers: room.peers(),
        })
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn membership(&self, connection: ConnectionId) -> Option<Membership> {
        self.memberships.get(&connection).map(|m| m.clone())
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(EventLog::default())
    }
}
