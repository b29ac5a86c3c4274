use crossterm::event::KeyCode;

use noxo::{
    Coord, MoveAddress, MoveOutcome, MoveRecord, Player, Round, Session, SessionError,
    SessionEvent,
};

/// What the loop is currently showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    GameOver,
    SessionLost,
}

/// Foreground state: the round, the cursor, and the optional network
/// session. The round is owned here and mutated only on this thread; the
/// session's reader thread communicates exclusively through polled events,
/// so there is no shared board to race on.
pub struct App {
    round: Round,
    session: Option<Session>,
    local_player: Option<Player>,
    connected: bool,
    /// Cursor over the full 9x9 surface, row-major.
    cursor_row: u8,
    cursor_col: u8,
    status: String,
    phase: Phase,
    should_quit: bool,
}

impl App {
    pub fn new(session: Option<Session>) -> App {
        let local_player = session.as_ref().map(Session::local_player);
        let connected = matches!(local_player, Some(Player::Nought));
        let status = match local_player {
            None => turn_message(Player::Cross),
            Some(Player::Cross) => "Waiting for client...".to_string(),
            Some(Player::Nought) => "Connected to server".to_string(),
        };
        App {
            round: Round::new(),
            session,
            local_player,
            connected,
            cursor_row: 4,
            cursor_col: 4,
            status,
            phase: Phase::Playing,
            should_quit: false,
        }
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> (u8, u8) {
        (self.cursor_row, self.cursor_col)
    }

    pub fn is_local_mode(&self) -> bool {
        self.local_player.is_none()
    }

    pub fn mode_label(&self) -> &'static str {
        match self.local_player {
            None => "local",
            Some(Player::Cross) => "host",
            Some(Player::Nought) => "client",
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn on_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up => self.move_cursor(-1, 0),
            KeyCode::Down => self.move_cursor(1, 0),
            KeyCode::Left => self.move_cursor(0, -1),
            KeyCode::Right => self.move_cursor(0, 1),
            KeyCode::Enter | KeyCode::Char(' ') => match self.phase {
                Phase::Playing => self.submit_cursor(),
                // A finished local round restarts in place; networked play
                // ends with the session.
                Phase::GameOver if self.is_local_mode() => self.restart(),
                _ => {}
            },
            KeyCode::Char('r') if self.phase == Phase::GameOver && self.is_local_mode() => {
                self.restart()
            }
            _ => {}
        }
    }

    /// Applies everything the reader thread queued since last frame, in
    /// arrival order.
    pub fn drain_session(&mut self) {
        let mut events = Vec::new();
        if let Some(session) = self.session.as_mut() {
            while let Some(event) = session.poll_event() {
                events.push(event);
            }
        }
        for event in events {
            match event {
                SessionEvent::PeerConnected(_) => {
                    self.connected = true;
                    self.status = "Client has connected".to_string();
                }
                SessionEvent::Move(record) => self.apply_remote(record),
                SessionEvent::Closed => {
                    if self.phase == Phase::Playing {
                        self.fail_session(SessionError::PeerDisconnected);
                    }
                }
                SessionEvent::Failed(err) => {
                    if self.phase == Phase::Playing {
                        self.fail_session(err);
                    }
                }
            }
        }
    }

    pub fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.send_bye();
            session.shutdown();
        }
    }

    fn restart(&mut self) {
        self.round = Round::new();
        self.phase = Phase::Playing;
        self.status = turn_message(Player::Cross);
    }

    fn move_cursor(&mut self, dy: i8, dx: i8) {
        self.cursor_row = (self.cursor_row as i8 + dy).rem_euclid(9) as u8;
        self.cursor_col = (self.cursor_col as i8 + dx).rem_euclid(9) as u8;
    }

    fn cursor_address(&self) -> MoveAddress {
        let outer = Coord::new(self.cursor_row / 3, self.cursor_col / 3);
        let inner = Coord::new(self.cursor_row % 3, self.cursor_col % 3);
        MoveAddress::new(outer, inner)
    }

    fn submit_cursor(&mut self) {
        if let Some(me) = self.local_player {
            if !self.connected {
                self.status = "Waiting for client...".to_string();
                return;
            }
            if self.round.current_player() != me {
                self.status = "It is not your turn".to_string();
                return;
            }
        }

        let address = self.cursor_address();
        match self.round.submit(address) {
            Err(reason) => self.status = reason.to_string(),
            Ok(outcome) => {
                self.send_applied(address);
                self.finish_move(outcome);
            }
        }
    }

    fn apply_remote(&mut self, record: MoveRecord) {
        let address = match record.address() {
            Ok(address) => address,
            Err(err) => return self.fail_session(SessionError::MalformedMessage(err)),
        };
        match self.round.replay(address) {
            Err(err) => self.fail_session(err),
            Ok(outcome) => {
                // Both sides run the same apply, so the sender's constraint
                // must match ours; a mismatch means the boards diverged.
                match record.next_active() {
                    Ok(next) if next == self.round.board().active_subboard() => {}
                    _ => log::warn!("peer constraint disagrees with local board"),
                }
                self.finish_move(outcome);
            }
        }
    }

    /// Every locally applied move goes to the peer, including the one that
    /// ends the round.
    fn send_applied(&mut self, address: MoveAddress) {
        let record = MoveRecord::new(
            address,
            !self.round.board().played(),
            self.round.board().active_subboard(),
        );
        let failed = match self.session.as_mut() {
            Some(session) => session.send_move(record).err(),
            None => None,
        };
        if let Some(err) = failed {
            self.fail_session(err);
        }
    }

    fn finish_move(&mut self, outcome: MoveOutcome) {
        match outcome {
            MoveOutcome::BoardWon { by, .. } => {
                self.phase = Phase::GameOver;
                self.status = format!("{} is the winner!", by.long_name());
            }
            MoveOutcome::Draw => {
                self.phase = Phase::GameOver;
                self.status = "Draw!".to_string();
            }
            MoveOutcome::Continue | MoveOutcome::SubBoardWon { .. } => {
                self.status = turn_message(self.round.current_player());
            }
        }
    }

    fn fail_session(&mut self, err: SessionError) {
        log::warn!("session ended: {}", err);
        self.phase = Phase::SessionLost;
        self.status = err.to_string();
        if let Some(mut session) = self.session.take() {
            session.shutdown();
        }
    }
}

fn turn_message(player: Player) -> String {
    format!("{}' turn", player.long_name())
}
