//! Message types for the gridduel line protocol.
//!
//! Every frame is one line: space-separated tokens, first token is the
//! message name (case-sensitive), the rest are positional arguments.
//! List payloads separate elements with `;` and fields within an element
//! with `,`.

use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

/// Separator between elements of a list payload (`a;b;c;`).
///
/// Every element is *terminated* by the separator, so a two-element
/// challenge listing reads `CHALLENGES alice;bob;`.
pub const LIST_SEPARATOR: char = ';';

/// Separator between fields of one element (`name,wins,losses,...`).
pub const FIELD_SEPARATOR: char = ',';

// ---------------------------------------------------------------------------
// ClientCommand
// ---------------------------------------------------------------------------

/// A command sent by a client to the server.
///
/// Which commands are legal depends on the session state: `LOGIN` while
/// logging in, the lobby commands while in the lobby, `PLAY`/`QUIT`
/// while in a match. The parser accepts any of them; the session state
/// machine decides what an out-of-state command means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// `LOGIN <username> <password>` — authenticate (or create) a user.
    Login { username: String, password: String },

    /// `CHALLENGES` — list pending incoming challenges.
    Challenges,

    /// `CHALLENGE <username>` — challenge another lobby player.
    Challenge { username: String },

    /// `ACCEPT <username>` — accept a pending challenge from `username`.
    Accept { username: String },

    /// `REFUSE <username>` — refuse a pending challenge from `username`.
    Refuse { username: String },

    /// `PLAY <row> <col>` — place a mark (match state only).
    Play { row: u8, col: u8 },

    /// `QUIT` — leave the lobby, or forfeit the current match.
    Quit,
}

impl ClientCommand {
    /// Parses one line into a command.
    ///
    /// # Errors
    /// [`ProtocolError`] when the line is empty, names an unknown
    /// command, or carries the wrong arguments.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().ok_or(ProtocolError::Empty)?;

        let cmd = match name {
            "LOGIN" => ClientCommand::Login {
                username: required(&mut tokens, "LOGIN")?,
                password: required(&mut tokens, "LOGIN")?,
            },
            "CHALLENGES" => ClientCommand::Challenges,
            "CHALLENGE" => ClientCommand::Challenge {
                username: required(&mut tokens, "CHALLENGE")?,
            },
            "ACCEPT" => ClientCommand::Accept {
                username: required(&mut tokens, "ACCEPT")?,
            },
            "REFUSE" => ClientCommand::Refuse {
                username: required(&mut tokens, "REFUSE")?,
            },
            "PLAY" => ClientCommand::Play {
                row: numeric(&mut tokens, "PLAY")?,
                col: numeric(&mut tokens, "PLAY")?,
            },
            "QUIT" => ClientCommand::Quit,
            other => {
                return Err(ProtocolError::UnknownCommand(other.to_string()));
            }
        };

        no_trailing(&mut tokens, cmd.name())?;
        Ok(cmd)
    }

    /// The wire name of this command.
    pub fn name(&self) -> &'static str {
        match self {
            ClientCommand::Login { .. } => "LOGIN",
            ClientCommand::Challenges => "CHALLENGES",
            ClientCommand::Challenge { .. } => "CHALLENGE",
            ClientCommand::Accept { .. } => "ACCEPT",
            ClientCommand::Refuse { .. } => "REFUSE",
            ClientCommand::Play { .. } => "PLAY",
            ClientCommand::Quit => "QUIT",
        }
    }
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientCommand::Login { username, password } => {
                write!(f, "LOGIN {username} {password}")
            }
            ClientCommand::Challenges => write!(f, "CHALLENGES"),
            ClientCommand::Challenge { username } => {
                write!(f, "CHALLENGE {username}")
            }
            ClientCommand::Accept { username } => write!(f, "ACCEPT {username}"),
            ClientCommand::Refuse { username } => write!(f, "REFUSE {username}"),
            ClientCommand::Play { row, col } => write!(f, "PLAY {row} {col}"),
            ClientCommand::Quit => write!(f, "QUIT"),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Who moves first, from the receiving side's perspective.
///
/// `GAMESTART 1` tells a player they open the game, `GAMESTART 2` that
/// their opponent does. The two participants always receive
/// complementary values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOrder {
    /// You move first.
    First,
    /// Your opponent moves first.
    Second,
}

impl TurnOrder {
    /// The wire token (`1` or `2`).
    pub fn token(self) -> u8 {
        match self {
            TurnOrder::First => 1,
            TurnOrder::Second => 2,
        }
    }

    /// The indicator the opponent receives.
    pub fn flipped(self) -> Self {
        match self {
            TurnOrder::First => TurnOrder::Second,
            TurnOrder::Second => TurnOrder::First,
        }
    }
}

/// The outcome code carried by `GAME_OVER <code>`.
///
/// Always computed from the receiving side's own perspective — the two
/// participants never share a verbatim code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverCode {
    /// `0` — the board filled with no line.
    Draw,
    /// `1` — you completed a line.
    Win,
    /// `2` — your opponent completed a line.
    Loss,
    /// `3` — your opponent disconnected; the win is yours.
    OpponentLeft,
}

impl GameOverCode {
    /// The numeric wire code.
    pub fn code(self) -> u8 {
        match self {
            GameOverCode::Draw => 0,
            GameOverCode::Win => 1,
            GameOverCode::Loss => 2,
            GameOverCode::OpponentLeft => 3,
        }
    }

    fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(GameOverCode::Draw),
            1 => Some(GameOverCode::Win),
            2 => Some(GameOverCode::Loss),
            3 => Some(GameOverCode::OpponentLeft),
            _ => None,
        }
    }
}

/// A message sent by the server to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// `OK` — handshake greeting, login success, or move accepted.
    Ok,

    /// `ERROR` without a code — the server is full; sent once on accept,
    /// after which the connection is closed.
    Full,

    /// `ERROR <code>` — see [`crate::codes`] for meanings per state.
    Error { code: u8 },

    /// `CHALLENGES <name1>;<name2>;…;` — pending challengers, oldest
    /// first. An empty listing is just `CHALLENGES`.
    Challenges { challengers: Vec<String> },

    /// `REFUSE` — a challenge was refused (sent to both the refusing
    /// player and the waiting challenger).
    Refuse,

    /// `GAMESTART <1|2>` — a match begins; the token says whether the
    /// receiver moves first.
    GameStart { order: TurnOrder },

    /// `PLAY <row> <col>` — relay of the opponent's move.
    Play { row: u8, col: u8 },

    /// `GAME_OVER <code>` — terminal match message.
    GameOver { code: GameOverCode },
}

impl ServerMessage {
    /// Parses one line into a server message.
    ///
    /// Used by clients and by the test suites that act as clients.
    ///
    /// # Errors
    /// [`ProtocolError`] when the line is empty, names an unknown
    /// message, or carries malformed arguments.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut tokens = line.split_whitespace();
        let name = tokens.next().ok_or(ProtocolError::Empty)?;

        match name {
            "OK" => Ok(ServerMessage::Ok),
            "ERROR" => match tokens.next() {
                None => Ok(ServerMessage::Full),
                Some(token) => {
                    let code = token.parse().map_err(|_| {
                        ProtocolError::InvalidArgument {
                            command: "ERROR",
                            value: token.to_string(),
                        }
                    })?;
                    Ok(ServerMessage::Error { code })
                }
            },
            "CHALLENGES" => {
                let challengers = tokens
                    .flat_map(|t| t.split(LIST_SEPARATOR))
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect();
                Ok(ServerMessage::Challenges { challengers })
            }
            "REFUSE" => Ok(ServerMessage::Refuse),
            "GAMESTART" => {
                let token: u8 = numeric(&mut tokens, "GAMESTART")?;
                let order = match token {
                    1 => TurnOrder::First,
                    2 => TurnOrder::Second,
                    other => {
                        return Err(ProtocolError::InvalidArgument {
                            command: "GAMESTART",
                            value: other.to_string(),
                        });
                    }
                };
                Ok(ServerMessage::GameStart { order })
            }
            "PLAY" => Ok(ServerMessage::Play {
                row: numeric(&mut tokens, "PLAY")?,
                col: numeric(&mut tokens, "PLAY")?,
            }),
            "GAME_OVER" => {
                let raw: u8 = numeric(&mut tokens, "GAME_OVER")?;
                let code = GameOverCode::from_code(raw).ok_or(
                    ProtocolError::InvalidArgument {
                        command: "GAME_OVER",
                        value: raw.to_string(),
                    },
                )?;
                Ok(ServerMessage::GameOver { code })
            }
            other => Err(ProtocolError::UnknownMessage(other.to_string())),
        }
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Ok => write!(f, "OK"),
            ServerMessage::Full => write!(f, "ERROR"),
            ServerMessage::Error { code } => write!(f, "ERROR {code}"),
            ServerMessage::Challenges { challengers } => {
                write!(f, "CHALLENGES")?;
                if !challengers.is_empty() {
                    write!(f, " ")?;
                    for name in challengers {
                        write!(f, "{name}{LIST_SEPARATOR}")?;
                    }
                }
                Ok(())
            }
            ServerMessage::Refuse => write!(f, "REFUSE"),
            ServerMessage::GameStart { order } => {
                write!(f, "GAMESTART {}", order.token())
            }
            ServerMessage::Play { row, col } => write!(f, "PLAY {row} {col}"),
            ServerMessage::GameOver { code } => {
                write!(f, "GAME_OVER {}", code.code())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerEntry
// ---------------------------------------------------------------------------

/// One element of a player listing: `name,wins,losses,draws,streak`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEntry {
    pub username: String,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_streak: u32,
}

impl fmt::Display for PlayerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}{sep}{}",
            self.username,
            self.wins,
            self.losses,
            self.draws,
            self.win_streak,
            sep = FIELD_SEPARATOR,
        )
    }
}

impl FromStr for PlayerEntry {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = s.split(FIELD_SEPARATOR);
        let username = fields
            .next()
            .filter(|name| !name.is_empty())
            .ok_or(ProtocolError::MissingArgument { command: "entry" })?
            .to_string();

        let mut stat = || -> Result<u32, ProtocolError> {
            let field = fields
                .next()
                .ok_or(ProtocolError::MissingArgument { command: "entry" })?;
            field.parse().map_err(|_| ProtocolError::InvalidArgument {
                command: "entry",
                value: field.to_string(),
            })
        };

        Ok(PlayerEntry {
            username,
            wins: stat()?,
            losses: stat()?,
            draws: stat()?,
            win_streak: stat()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Token helpers
// ---------------------------------------------------------------------------

fn required<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
) -> Result<String, ProtocolError> {
    tokens
        .next()
        .map(str::to_string)
        .ok_or(ProtocolError::MissingArgument { command })
}

fn numeric<'a, T: FromStr>(
    tokens: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
) -> Result<T, ProtocolError> {
    let token = tokens
        .next()
        .ok_or(ProtocolError::MissingArgument { command })?;
    token.parse().map_err(|_| ProtocolError::InvalidArgument {
        command,
        value: token.to_string(),
    })
}

fn no_trailing<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    command: &'static str,
) -> Result<(), ProtocolError> {
    match tokens.next() {
        None => Ok(()),
        Some(extra) => Err(ProtocolError::InvalidArgument {
            command,
            value: extra.to_string(),
        }),
    }
}

// =========================================================================
// Tests
// =========================================================================
