//! Integration tests for the gridduel server: real loopback sockets,
//! full login → lobby → match flows.

use std::time::Duration;

use gridduel::GridduelServerBuilder;
use gridduel_protocol::{GameOverCode, ServerMessage, TurnOrder};
use gridduel_session::MemoryCredentialStore;
use gridduel_transport::{Connection, TcpLineConnection};

// =========================================================================
// Helpers
// =========================================================================

/// Starts a server on a random port and returns the address.
async fn start_server(max_players: usize) -> String {
    let server = GridduelServerBuilder::new()
        .bind("127.0.0.1:0")
        .max_players(max_players)
        .build(MemoryCredentialStore::new())
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

/// A test client speaking the line protocol.
struct Client {
    conn: TcpLineConnection,
}

impl Client {
    /// Connects without reading the greeting.
    async fn connect(addr: &str) -> Self {
        let stream = tokio::net::TcpStream::connect(addr)
            .await
            .expect("client should connect");
        Self {
            conn: TcpLineConnection::from_stream(stream),
        }
    }

    /// Connects and consumes the `OK` greeting.
    async fn connect_admitted(addr: &str) -> Self {
        let client = Self::connect(addr).await;
        assert_eq!(client.recv().await, ServerMessage::Ok, "greeting");
        client
    }

    /// Connects, drains the greeting, and logs in as `username`.
    async fn login(addr: &str, username: &str, password: &str) -> Self {
        let client = Self::connect_admitted(addr).await;
        client.send(&format!("LOGIN {username} {password}")).await;
        assert_eq!(
            client.recv().await,
            ServerMessage::Ok,
            "login as {username}"
        );
        client
    }

    async fn send(&self, line: &str) {
        self.conn.send_line(line).await.expect("send should succeed");
    }

    /// Receives and parses the next server message, with a timeout so a
    /// wedged server fails the test instead of hanging it.
    async fn recv(&self) -> ServerMessage {
        let line = tokio::time::timeout(
            Duration::from_secs(5),
            self.conn.recv_line(),
        )
        .await
        .expect("timed out waiting for the server")
        .expect("recv should succeed")
        .expect("server closed the connection");
        ServerMessage::parse(&line).expect("server speaks the protocol")
    }

    /// Waits for the server to close this connection.
    async fn expect_closed(&self) {
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            self.conn.recv_line(),
        )
        .await
        .expect("timed out waiting for close")
        .expect("recv should succeed");
        assert!(result.is_none(), "expected a closed connection");
    }
}

/// Logs in `alice` and `bob`, has alice challenge bob and bob accept,
/// and returns both clients with their announced turn orders.
async fn setup_match(addr: &str) -> (Client, Client, TurnOrder, TurnOrder) {
    let alice = Client::login(addr, "alice", "pw").await;
    let bob = Client::login(addr, "bob", "pw").await;

    alice.send("CHALLENGE bob").await;

    // Wait until bob actually sees the pending challenge before
    // accepting — the challenge lands on another task's schedule.
    loop {
        bob.send("CHALLENGES").await;
        if let ServerMessage::Challenges { challengers } = bob.recv().await {
            if challengers.iter().any(|name| name == "alice") {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    bob.send("ACCEPT alice").await;
    let bob_order = match bob.recv().await {
        ServerMessage::GameStart { order } => order,
        other => panic!("expected GAMESTART for bob, got {other:?}"),
    };
    let alice_order = match alice.recv().await {
        ServerMessage::GameStart { order } => order,
        other => panic!("expected GAMESTART for alice, got {other:?}"),
    };

    assert_eq!(
        alice_order,
        bob_order.flipped(),
        "the two sides must receive complementary turn indicators"
    );

    (alice, bob, alice_order, bob_order)
}

/// Orders the pair by who moves first, keeping the usernames attached.
fn by_turn_order(
    alice: Client,
    bob: Client,
    alice_order: TurnOrder,
) -> ((Client, &'static str), (Client, &'static str)) {
    if alice_order == TurnOrder::First {
        ((alice, "alice"), (bob, "bob"))
    } else {
        ((bob, "bob"), (alice, "alice"))
    }
}

/// Plays one non-ending move: the mover gets `OK`, the other side the
/// relayed coordinates.
async fn play(mover: &Client, watcher: &Client, row: u8, col: u8) {
    mover.send(&format!("PLAY {row} {col}")).await;
    assert_eq!(mover.recv().await, ServerMessage::Ok, "move {row} {col}");
    assert_eq!(
        watcher.recv().await,
        ServerMessage::Play { row, col },
        "relay of {row} {col}"
    );
}

// =========================================================================
// Connecting
// =========================================================================

#[tokio::test]
async fn test_connect_greets_with_ok() {
    let addr = start_server(4).await;
    let client = Client::connect(&addr).await;
    assert_eq!(client.recv().await, ServerMessage::Ok);
}

#[tokio::test]
async fn test_server_full_refuses_with_error_and_close() {
    let addr = start_server(1).await;
    let _admitted = Client::connect_admitted(&addr).await;

    let refused = Client::connect(&addr).await;
    assert_eq!(refused.recv().await, ServerMessage::Full);
    refused.expect_closed().await;
}

#[tokio::test]
async fn test_slot_is_released_after_disconnect() {
    let addr = start_server(1).await;

    let first = Client::connect_admitted(&addr).await;
    drop(first);

    // The slot frees once the handler notices the disconnect.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let retry = Client::connect(&addr).await;
        if retry.recv().await == ServerMessage::Ok {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "slot never came back"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

// =========================================================================
// Logging in
// =========================================================================

#[tokio::test]
async fn test_login_new_user_is_accepted() {
    let addr = start_server(4).await;
    let client = Client::connect_admitted(&addr).await;
    client.send("LOGIN alice pw").await;
    assert_eq!(client.recv().await, ServerMessage::Ok);
}

#[tokio::test]
async fn test_login_wrong_password_gets_error_2_and_can_retry() {
    let addr = start_server(4).await;

    // Create the account, then free the username again.
    let creator = Client::login(&addr, "alice", "secret").await;
    drop(creator);

    let client = Client::connect_admitted(&addr).await;
    client.send("LOGIN alice wrong").await;
    assert_eq!(client.recv().await, ServerMessage::Error { code: 2 });

    // The loop stays open: a corrected attempt succeeds (retried while
    // the first connection's cleanup settles).
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        client.send("LOGIN alice secret").await;
        match client.recv().await {
            ServerMessage::Ok => break,
            ServerMessage::Error { code: 1 } => {
                assert!(
                    tokio::time::Instant::now() < deadline,
                    "username never freed"
                );
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            other => panic!("unexpected login reply: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_login_connected_username_gets_error_1() {
    let addr = start_server(4).await;
    let _first = Client::login(&addr, "alice", "pw").await;

    let second = Client::connect_admitted(&addr).await;
    second.send("LOGIN alice pw").await;
    assert_eq!(second.recv().await, ServerMessage::Error { code: 1 });

    // Still logging in: a different username works on the same
    // connection.
    second.send("LOGIN bob pw").await;
    assert_eq!(second.recv().await, ServerMessage::Ok);
}

#[tokio::test]
async fn test_username_is_free_after_disconnect() {
    let addr = start_server(4).await;
    let first = Client::login(&addr, "alice", "pw").await;
    drop(first);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let retry = Client::connect_admitted(&addr).await;
        retry.send("LOGIN alice pw").await;
        match retry.recv().await {
            ServerMessage::Ok => break,
            ServerMessage::Error { code: 1 } => {
                assert!(
                    tokio::time::Instant::now() < deadline,
                    "username never freed"
                );
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            other => panic!("unexpected login reply: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_non_login_input_closes_the_connection() {
    let addr = start_server(4).await;
    let client = Client::connect_admitted(&addr).await;
    client.send("CHALLENGES").await;
    client.expect_closed().await;
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_challenges_listing_starts_empty() {
    let addr = start_server(4).await;
    let client = Client::login(&addr, "alice", "pw").await;

    client.send("CHALLENGES").await;
    assert_eq!(
        client.recv().await,
        ServerMessage::Challenges { challengers: vec![] }
    );
}

#[tokio::test]
async fn test_challenge_unknown_player_gets_error_1() {
    let addr = start_server(4).await;
    let client = Client::login(&addr, "alice", "pw").await;

    client.send("CHALLENGE ghost").await;
    assert_eq!(client.recv().await, ServerMessage::Error { code: 1 });
}

#[tokio::test]
async fn test_challenge_player_in_game_gets_error_2() {
    let addr = start_server(4).await;
    let (_alice, _bob, _, _) = setup_match(&addr).await;

    let carol = Client::login(&addr, "carol", "pw").await;
    carol.send("CHALLENGE alice").await;
    assert_eq!(carol.recv().await, ServerMessage::Error { code: 2 });
}

#[tokio::test]
async fn test_refused_challenge_notifies_both_sides() {
    let addr = start_server(4).await;
    let alice = Client::login(&addr, "alice", "pw").await;
    let bob = Client::login(&addr, "bob", "pw").await;

    alice.send("CHALLENGE bob").await;
    loop {
        bob.send("CHALLENGES").await;
        if let ServerMessage::Challenges { challengers } = bob.recv().await {
            if !challengers.is_empty() {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    bob.send("REFUSE alice").await;
    assert_eq!(bob.recv().await, ServerMessage::Refuse);
    assert_eq!(alice.recv().await, ServerMessage::Refuse);

    // Both are still in the lobby.
    alice.send("CHALLENGES").await;
    assert!(matches!(
        alice.recv().await,
        ServerMessage::Challenges { .. }
    ));
}

#[tokio::test]
async fn test_malformed_lobby_command_gets_error_0_and_stays_open() {
    let addr = start_server(4).await;
    let client = Client::login(&addr, "alice", "pw").await;

    client.send("FROBNICATE now").await;
    assert_eq!(client.recv().await, ServerMessage::Error { code: 0 });

    // The connection survived the protocol error.
    client.send("CHALLENGES").await;
    assert!(matches!(
        client.recv().await,
        ServerMessage::Challenges { .. }
    ));
}

#[tokio::test]
async fn test_play_in_lobby_is_out_of_state() {
    let addr = start_server(4).await;
    let client = Client::login(&addr, "alice", "pw").await;

    client.send("PLAY 0 0").await;
    assert_eq!(client.recv().await, ServerMessage::Error { code: 0 });
}

// =========================================================================
// Matches
// =========================================================================

#[tokio::test]
async fn test_full_match_first_mover_wins_top_row() {
    let addr = start_server(4).await;
    let (alice, bob, alice_order, _) = setup_match(&addr).await;
    let ((first, _), (second, _)) = by_turn_order(alice, bob, alice_order);

    // First takes the top row, second the middle row.
    play(&first, &second, 0, 0).await;
    play(&second, &first, 1, 0).await;
    play(&first, &second, 0, 1).await;
    play(&second, &first, 1, 1).await;

    // The winning move: OK + GAME_OVER 1 for the mover, GAME_OVER 2 for
    // the loser (no relay of the final move).
    first.send("PLAY 0 2").await;
    assert_eq!(first.recv().await, ServerMessage::Ok);
    assert_eq!(
        first.recv().await,
        ServerMessage::GameOver {
            code: GameOverCode::Win
        }
    );
    assert_eq!(
        second.recv().await,
        ServerMessage::GameOver {
            code: GameOverCode::Loss
        }
    );

    // Both sides are back in the lobby and can talk again.
    first.send("CHALLENGES").await;
    assert!(matches!(
        first.recv().await,
        ServerMessage::Challenges { .. }
    ));
    second.send("CHALLENGES").await;
    assert!(matches!(
        second.recv().await,
        ServerMessage::Challenges { .. }
    ));
}

#[tokio::test]
async fn test_full_match_draw_sends_code_0_to_both() {
    let addr = start_server(4).await;
    let (alice, bob, alice_order, _) = setup_match(&addr).await;
    let ((first, _), (second, _)) = by_turn_order(alice, bob, alice_order);

    // F O F / F O F / O F O with no line: a known draw sequence.
    play(&first, &second, 0, 0).await;
    play(&second, &first, 0, 1).await;
    play(&first, &second, 0, 2).await;
    play(&second, &first, 1, 1).await;
    play(&first, &second, 1, 0).await;
    play(&second, &first, 2, 0).await;
    play(&first, &second, 1, 2).await;
    play(&second, &first, 2, 2).await;

    first.send("PLAY 2 1").await;
    assert_eq!(first.recv().await, ServerMessage::Ok);
    assert_eq!(
        first.recv().await,
        ServerMessage::GameOver {
            code: GameOverCode::Draw
        }
    );
    assert_eq!(
        second.recv().await,
        ServerMessage::GameOver {
            code: GameOverCode::Draw
        }
    );
}

#[tokio::test]
async fn test_illegal_moves_get_error_1_without_advancing_the_turn() {
    let addr = start_server(4).await;
    let (alice, bob, alice_order, _) = setup_match(&addr).await;
    let ((first, _), (second, _)) = by_turn_order(alice, bob, alice_order);

    // Out of range.
    first.send("PLAY 5 5").await;
    assert_eq!(first.recv().await, ServerMessage::Error { code: 1 });
    // Non-numeric coordinates.
    first.send("PLAY a b").await;
    assert_eq!(first.recv().await, ServerMessage::Error { code: 1 });

    // The turn never advanced; a legal move still works and reaches the
    // opponent.
    play(&first, &second, 0, 0).await;

    // Occupied cell, from the second mover now.
    second.send("PLAY 0 0").await;
    assert_eq!(second.recv().await, ServerMessage::Error { code: 1 });
    play(&second, &first, 1, 1).await;
}

#[tokio::test]
async fn test_quit_mid_match_credits_opponent_with_disconnect_win() {
    let addr = start_server(4).await;
    let (alice, bob, alice_order, _) = setup_match(&addr).await;
    let ((first, _), (second, _)) = by_turn_order(alice, bob, alice_order);

    first.send("QUIT").await;
    assert_eq!(
        second.recv().await,
        ServerMessage::GameOver {
            code: GameOverCode::OpponentLeft
        }
    );

    // The quitter's connection is closed; the winner is back in the
    // lobby.
    first.expect_closed().await;
    second.send("CHALLENGES").await;
    assert!(matches!(
        second.recv().await,
        ServerMessage::Challenges { .. }
    ));
}

#[tokio::test]
async fn test_abrupt_disconnect_mid_match_credits_opponent() {
    let addr = start_server(4).await;
    let (alice, bob, alice_order, _) = setup_match(&addr).await;
    let ((first, _), (second, _)) = by_turn_order(alice, bob, alice_order);

    // The socket just dies — no QUIT.
    drop(first);

    assert_eq!(
        second.recv().await,
        ServerMessage::GameOver {
            code: GameOverCode::OpponentLeft
        }
    );
}

#[tokio::test]
async fn test_opponent_is_challengeable_again_after_match() {
    let addr = start_server(4).await;
    let (alice, bob, alice_order, _) = setup_match(&addr).await;
    let ((first, quitter), (second, survivor)) =
        by_turn_order(alice, bob, alice_order);

    // End the match quickly via forfeit.
    first.send("QUIT").await;
    assert_eq!(
        second.recv().await,
        ServerMessage::GameOver {
            code: GameOverCode::OpponentLeft
        }
    );

    let carol = Client::login(&addr, "carol", "pw").await;

    // The quitter is gone from the registry entirely (retried while
    // the closed handler's cleanup settles).
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        carol.send(&format!("CHALLENGE {quitter}")).await;
        match carol.recv().await {
            ServerMessage::Error { code: 1 } => break,
            ServerMessage::Error { code: 2 } => {
                assert!(
                    tokio::time::Instant::now() < deadline,
                    "quitter never left the registry"
                );
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    // The survivor is Online again: a new challenge reaches them (it
    // would be ERROR 2 if their status were still InGame) and they can
    // resolve it from the lobby.
    carol.send(&format!("CHALLENGE {survivor}")).await;
    loop {
        second.send("CHALLENGES").await;
        if let ServerMessage::Challenges { challengers } = second.recv().await
        {
            if challengers.iter().any(|name| name == "carol") {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    second.send("REFUSE carol").await;
    assert_eq!(second.recv().await, ServerMessage::Refuse);
    assert_eq!(carol.recv().await, ServerMessage::Refuse);
}
