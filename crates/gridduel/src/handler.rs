//! Per-connection handler: the session state machine.
//!
//! Each accepted connection gets its own task running this handler. The
//! flow is:
//!   1. `Connecting` — capacity check, `OK`/`ERROR` greeting
//!   2. `LoggingIn` — loop on `LOGIN` until the credentials check out
//!   3. `InLobby` — one command at a time; a challenge may hand the
//!      connection to the match loop
//!   4. `InMatch` — the turn-arbitrated game loop, then back to the lobby
//!   5. `Closed` — guards release the slot, the registry entry, and any
//!      game the connection was part of
//!
//! Any transport failure, in any state, unwinds through the guards so
//! no peer is left waiting on a dead connection.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use gridduel_game::{GameSession, MatchResult, MoveOutcome, Seat, TurnUpdate};
use gridduel_lobby::{ChallengeReply, LobbyError, Player, Status};
use gridduel_protocol::{
    ClientCommand, GameOverCode, ServerMessage, TurnOrder, codes,
};
use gridduel_session::{CredentialStore, LoginOutcome};
use gridduel_transport::{Connection, TcpLineConnection};

use crate::GridduelError;
use crate::server::ServerState;

/// Drop guard that releases the connection slot when the handler exits,
/// however it exits.
struct SlotGuard<S: CredentialStore> {
    state: Arc<ServerState<S>>,
}

impl<S: CredentialStore> Drop for SlotGuard<S> {
    fn drop(&mut self) {
        self.state.release_slot();
    }
}

/// Drop guard that removes the player from the registry and refuses
/// their still-pending challenges, so competing challengers are never
/// left parked on a player who is gone.
struct PlayerGuard<S: CredentialStore> {
    state: Arc<ServerState<S>>,
    username: String,
}

impl<S: CredentialStore> Drop for PlayerGuard<S> {
    fn drop(&mut self) {
        if let Some(player) = self.state.registry.remove(&self.username) {
            player.refuse_all_pending();
        }
    }
}

/// Drop guard that abandons the game if this side leaves it unresolved.
/// A no-op once the game is over, so normal endings are unaffected.
struct AbandonGuard {
    game: Arc<GameSession>,
    seat: Seat,
}

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        self.game.abandon(self.seat);
    }
}

/// How the match loop handed control back.
enum MatchExit {
    /// The game ended; the player returns to the lobby.
    BackToLobby,
    /// The player quit mid-match; the connection is done.
    Quit,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<S: CredentialStore>(
    conn: TcpLineConnection,
    state: Arc<ServerState<S>>,
) -> Result<(), GridduelError> {
    let conn_id = conn.id();

    // --- Connecting ---
    if !state.try_reserve_slot() {
        tracing::info!(%conn_id, max_players = state.max_players, "server full, refusing connection");
        // Best effort: the client may already be gone.
        let _ = send(&conn, &ServerMessage::Full).await;
        let _ = conn.close().await;
        return Ok(());
    }
    let _slot = SlotGuard {
        state: Arc::clone(&state),
    };
    tracing::info!(
        %conn_id,
        connected = state.connected.load(Ordering::Relaxed),
        max_players = state.max_players,
        "connection admitted"
    );
    send(&conn, &ServerMessage::Ok).await?;

    // --- LoggingIn ---
    let Some(player) = login(&conn, &state).await? else {
        return Ok(());
    };
    let _player_guard = PlayerGuard {
        state: Arc::clone(&state),
        username: player.username().to_string(),
    };

    // --- InLobby / InMatch ---
    lobby(&conn, &state, &player).await
}

/// Loops on `LOGIN` until the credentials check out and the username is
/// free. Returns `None` when the client goes away (or sends anything
/// that isn't a login) — the connection is closed in that case.
async fn login<S: CredentialStore>(
    conn: &TcpLineConnection,
    state: &Arc<ServerState<S>>,
) -> Result<Option<Arc<Player>>, GridduelError> {
    loop {
        let Some(line) = conn.recv_line().await? else {
            return Ok(None);
        };

        let (username, password) = match ClientCommand::parse(&line) {
            Ok(ClientCommand::Login { username, password }) => {
                (username, password)
            }
            other => {
                tracing::debug!(
                    conn_id = %conn.id(),
                    ?other,
                    "expected LOGIN, closing connection"
                );
                let _ = conn.close().await;
                return Ok(None);
            }
        };

        let outcome = state.credentials.resolve(&username, &password).await?;
        if outcome == LoginOutcome::WrongPassword {
            send(
                conn,
                &ServerMessage::Error {
                    code: codes::LOGIN_WRONG_PASSWORD,
                },
            )
            .await?;
            continue;
        }

        let player = Arc::new(Player::new(&username));
        match state.registry.insert(Arc::clone(&player)) {
            Ok(()) => {
                tracing::info!(
                    conn_id = %conn.id(),
                    %username,
                    new_account = (outcome == LoginOutcome::AcceptedNew),
                    "login successful"
                );
                send(conn, &ServerMessage::Ok).await?;
                return Ok(Some(player));
            }
            Err(_) => {
                // The only insert failure: username already connected.
                send(
                    conn,
                    &ServerMessage::Error {
                        code: codes::LOGIN_ALREADY_CONNECTED,
                    },
                )
                .await?;
            }
        }
    }
}

/// The lobby loop: one command per iteration, until quit or disconnect.
async fn lobby<S: CredentialStore>(
    conn: &TcpLineConnection,
    state: &Arc<ServerState<S>>,
    player: &Arc<Player>,
) -> Result<(), GridduelError> {
    loop {
        let Some(line) = conn.recv_line().await? else {
            return Ok(());
        };

        let cmd = match ClientCommand::parse(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::debug!(
                    username = player.username(),
                    error = %e,
                    "malformed lobby command"
                );
                send(conn, &ServerMessage::Error { code: codes::PROTOCOL })
                    .await?;
                continue;
            }
        };

        match cmd {
            ClientCommand::Challenges => {
                send(
                    conn,
                    &ServerMessage::Challenges {
                        challengers: player.pending_challengers(),
                    },
                )
                .await?;
            }

            ClientCommand::Challenge { username } => {
                match state.matchmaker.challenge(player, &username).await {
                    Ok(ChallengeReply::Accepted(game)) => {
                        player.set_status(Status::InGame);
                        if let MatchExit::Quit =
                            run_match::<S>(conn, player, game).await?
                        {
                            return Ok(());
                        }
                    }
                    Ok(ChallengeReply::Refused) => {
                        send(conn, &ServerMessage::Refuse).await?;
                    }
                    Err(LobbyError::PlayerNotFound(_)) => {
                        send(
                            conn,
                            &ServerMessage::Error {
                                code: codes::CHALLENGE_NOT_FOUND,
                            },
                        )
                        .await?;
                    }
                    Err(_) => {
                        send(
                            conn,
                            &ServerMessage::Error {
                                code: codes::CHALLENGE_UNAVAILABLE,
                            },
                        )
                        .await?;
                    }
                }
            }

            ClientCommand::Accept { username } => {
                // No pending challenge from that name is a silent no-op.
                if let Some(game) = state.matchmaker.accept(player, &username)
                {
                    if let MatchExit::Quit =
                        run_match::<S>(conn, player, game).await?
                    {
                        return Ok(());
                    }
                }
            }

            ClientCommand::Refuse { username } => {
                if state.matchmaker.refuse(player, &username) {
                    send(conn, &ServerMessage::Refuse).await?;
                }
            }

            ClientCommand::Quit => {
                tracing::info!(username = player.username(), "player quit");
                let _ = conn.close().await;
                return Ok(());
            }

            ClientCommand::Login { .. } | ClientCommand::Play { .. } => {
                send(conn, &ServerMessage::Error { code: codes::PROTOCOL })
                    .await?;
            }
        }
    }
}

/// The match loop, run by both participants' handlers against the same
/// shared game.
///
/// On this side's turn: read a command (`PLAY` or `QUIT`). On the other
/// side's turn: wait on the game for the next relay, ending, or
/// disconnect. All waiting is notification-driven — no polling.
async fn run_match<S: CredentialStore>(
    conn: &TcpLineConnection,
    player: &Arc<Player>,
    game: Arc<GameSession>,
) -> Result<MatchExit, GridduelError> {
    let seat = game
        .seat_of(player.username())
        .expect("participant is seated in its own game");

    // If this handler bails out while the game is still running, the
    // opponent gets a disconnect win instead of waiting forever. Once
    // the game is over the guard's abandon is a no-op, so normal
    // endings pass through it unchanged.
    let _guard = AbandonGuard {
        game: Arc::clone(&game),
        seat,
    };

    let order = if game.opening_seat() == seat {
        TurnOrder::First
    } else {
        TurnOrder::Second
    };
    send(conn, &ServerMessage::GameStart { order }).await?;
    tracing::info!(
        username = player.username(),
        opponent = game.username(seat.other()),
        first = (order == TurnOrder::First),
        "match started"
    );

    loop {
        if game.is_turn(seat) {
            let Some(line) = conn.recv_line().await? else {
                // Abrupt disconnect on our turn; the guard abandons.
                return Ok(MatchExit::Quit);
            };

            match ClientCommand::parse(&line) {
                Ok(ClientCommand::Play { row, col }) => {
                    match game.submit_move(seat, row, col) {
                        Ok(outcome) => {
                            send(conn, &ServerMessage::Ok).await?;
                            if let MoveOutcome::Ended(result) = outcome {
                                finish_match(conn, player, result).await?;
                                return Ok(MatchExit::BackToLobby);
                            }
                        }
                        Err(e) => {
                            tracing::debug!(
                                username = player.username(),
                                error = %e,
                                "move rejected"
                            );
                            send(
                                conn,
                                &ServerMessage::Error {
                                    code: codes::MOVE_REJECTED,
                                },
                            )
                            .await?;
                        }
                    }
                }
                Ok(ClientCommand::Quit) => {
                    // Explicit forfeit: the guard credits the opponent.
                    let _ = conn.close().await;
                    return Ok(MatchExit::Quit);
                }
                other => {
                    tracing::debug!(
                        username = player.username(),
                        ?other,
                        "unexpected command during match"
                    );
                    send(
                        conn,
                        &ServerMessage::Error {
                            code: codes::MOVE_REJECTED,
                        },
                    )
                    .await?;
                }
            }
        } else {
            match game.await_update(seat).await {
                TurnUpdate::OpponentMoved { row, col } => {
                    send(conn, &ServerMessage::Play { row, col }).await?;
                }
                TurnUpdate::Ended(result) => {
                    finish_match(conn, player, result).await?;
                    return Ok(MatchExit::BackToLobby);
                }
            }
        }
    }
}

/// Wraps up this side of a finished match: stats, status, leftover
/// challenges, and the terminal `GAME_OVER` message.
async fn finish_match(
    conn: &TcpLineConnection,
    player: &Arc<Player>,
    result: MatchResult,
) -> Result<(), GridduelError> {
    player.record_result(result);
    player.set_status(Status::Online);
    // Challenges that queued up before the match started are stale now.
    player.refuse_all_pending();

    let code = match result {
        MatchResult::Draw => GameOverCode::Draw,
        MatchResult::Won => GameOverCode::Win,
        MatchResult::Lost => GameOverCode::Loss,
        MatchResult::OpponentLeft => GameOverCode::OpponentLeft,
    };
    tracing::info!(
        username = player.username(),
        result = ?result,
        streak = player.stats().win_streak,
        "match finished"
    );
    send(conn, &ServerMessage::GameOver { code }).await
}

/// Sends one protocol message over the connection.
async fn send(
    conn: &TcpLineConnection,
    msg: &ServerMessage,
) -> Result<(), GridduelError> {
    conn.send_line(&msg.to_string()).await.map_err(Into::into)
}
