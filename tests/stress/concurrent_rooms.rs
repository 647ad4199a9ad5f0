//! Room capacity and bookkeeping under concurrent joins and leaves

use bit_messenger::eventlog::EventLog;
use bit_messenger::relay::{Connection, RelayError, RoomManager, MAX_OCCUPANTS};
use std::sync::Arc;

#[test]
fn test_concurrent_joins_admit_exactly_two() {
    for round in 0..20 {
        let rooms = Arc::new(RoomManager::new(EventLog::new(1000)));
        let room_id = format!("contested-{round}");

        let results: Vec<Result<_, RelayError>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| {
                    let rooms = rooms.clone();
                    let room_id = room_id.clone();
                    scope.spawn(move || {
                        let (conn, rx) = Connection::new();
                        let result = rooms.join(&conn, &room_id);
                        (result, conn, rx)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .map(|(result, _conn, _rx)| result)
                .collect()
        });

        let admitted = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(RelayError::RoomFull(_))))
            .count();
        assert_eq!(admitted, MAX_OCCUPANTS, "round {round}");
        assert_eq!(rejected, 16 - MAX_OCCUPANTS, "round {round}");
        assert_eq!(rooms.room(&room_id).unwrap().peers.len(), MAX_OCCUPANTS);
    }
}

#[test]
fn test_join_leave_churn_leaves_no_rooms() {
    let rooms = Arc::new(RoomManager::new(EventLog::new(100)));

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let rooms = rooms.clone();
            scope.spawn(move || {
                for i in 0..200 {
                    let room_id = format!("room-{}", (worker + i) % 5);
                    let (conn, _rx) = Connection::new();
                    if rooms.join(&conn, &room_id).is_ok() {
                        let occupants = rooms.room(&room_id).map(|r| r.peers.len()).unwrap_or(0);
                        assert!(occupants <= MAX_OCCUPANTS);
                        assert!(rooms.leave(&conn, "close"));
                    }
                    assert!(!rooms.leave(&conn, "close"));
                }
            });
        }
    });

    assert_eq!(rooms.room_count(), 0);
}

#[test]
fn test_many_rooms_in_parallel() {
    let rooms = Arc::new(RoomManager::new(EventLog::new(100)));

    let connections: Vec<(Connection, Connection)> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..64)
            .map(|i| {
                let rooms = rooms.clone();
                scope.spawn(move || {
                    let (a, _a_rx) = Connection::new();
                    let (b, _b_rx) = Connection::new();
                    let room_id = format!("pair-{i}");
                    rooms.join(&a, &room_id).unwrap();
                    rooms.join(&b, &room_id).unwrap();
                    (a, b)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(rooms.room_count(), 64);
    for (a, b) in &connections {
        assert_eq!(rooms.room_of(a.id()), rooms.room_of(b.id()));
        rooms.leave(a, "close");
        rooms.leave(b, "close");
    }
    assert_eq!(rooms.room_count(), 0);
}
