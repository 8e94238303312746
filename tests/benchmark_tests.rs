//! Performance benchmarks for the room's hot paths

use server::agent::Agent;
use server::room::{OutboxReceiver, Room, RoomEvent};
use shared::{ClientMessage, Direction, Position, ServerMessage};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;

fn admit(room: &mut Room, position: Position) -> (Arc<Agent>, OutboxReceiver) {
    let agent = Arc::new(Agent::at(position));
    let (admitted, mut admission) = oneshot::channel();
    room.handle(RoomEvent::Join {
        agent: Arc::clone(&agent),
        admitted,
    });
    (agent, admission.try_recv().unwrap())
}

/// Benchmarks inbound frame decoding
#[test]
fn benchmark_client_decode() {
    let frames = [
        r#"{"action":"ping"}"#,
        r#"{"action":"move","t":1}"#,
        r#"{"action":"login","name":"someone"}"#,
        r#"{"action":"unknown"}"#,
    ];

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let _ = ClientMessage::decode(frames[i % frames.len()]);
    }

    let duration = start.elapsed();
    println!(
        "Client decode: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks movement stepping and clamping
#[test]
fn benchmark_movement() {
    let directions = [
        Direction::Right,
        Direction::Down,
        Direction::Left,
        Direction::Up,
        Direction::Right,
    ];
    let mut position = Position::new(225, 225);

    let iterations = 1_000_000;
    let start = Instant::now();

    for i in 0..iterations {
        if let Some(next) = position.step(directions[i % directions.len()]) {
            position = next;
        }
    }

    let duration = start.elapsed();
    println!(
        "Movement: {} steps in {:?} ({:.2} ns/step)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!((0..=450).contains(&position.x));
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks broadcast fan-out through the coordinator
#[test]
fn benchmark_broadcast_fan_out() {
    let mut room = Room::new();
    let mut outboxes: Vec<OutboxReceiver> = (0..100)
        .map(|i| admit(&mut room, Position::new(i * 4, 100)).1)
        .collect();

    let payload = ServerMessage::Move {
        name: "mover".to_string(),
        x: 105,
        y: 100,
    }
    .encode()
    .unwrap();

    let broadcasts = 1000;
    let start = Instant::now();

    for _ in 0..broadcasts {
        room.handle(RoomEvent::Broadcast {
            payload: payload.clone(),
        });
    }

    let duration = start.elapsed();
    println!(
        "Broadcast: {} members × {} broadcasts in {:?} ({:.2} μs/broadcast)",
        room.len(),
        broadcasts,
        duration,
        duration.as_micros() as f64 / broadcasts as f64
    );

    for outbox in &mut outboxes {
        let mut delivered = 0;
        while outbox.try_recv().is_ok() {
            delivered += 1;
        }
        assert_eq!(delivered, broadcasts);
    }

    // Should complete in under 5 seconds
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks churn: many joins, logins and leaves
#[test]
fn benchmark_membership_churn() {
    let mut room = Room::new();
    let (_watcher, mut watcher_outbox) = admit(&mut room, Position::new(0, 0));

    let agents = 5_000;
    let start = Instant::now();

    for i in 0..agents {
        let (agent, _outbox) = admit(&mut room, Position::new(100, 100));
        agent.set_name(format!("player{}", i));
        room.handle(RoomEvent::BindName { id: agent.id() });
        room.handle(RoomEvent::Leave { id: agent.id() });
    }

    let duration = start.elapsed();
    println!(
        "Churn: {} join/login/leave cycles in {:?} ({:.2} μs/cycle)",
        agents,
        duration,
        duration.as_micros() as f64 / agents as f64
    );

    assert_eq!(room.len(), 1);
    let mut logouts = 0;
    while watcher_outbox.try_recv().is_ok() {
        logouts += 1;
    }
    assert_eq!(logouts, agents);
    assert!(duration.as_millis() < 5000);
}
