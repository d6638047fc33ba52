//! Moves cards between the provider, boards, the discard pile and the
//! pending draw slot.
//!
//! Every method works on a caller-owned `Lobby` (the working copy held under
//! the lobby lock). Methods that call the provider finish all remote calls
//! before touching the lobby, so an upstream failure leaves it as it was.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::cards::Card;
use crate::domain::deck::Deck;
use crate::domain::lobby::{Lobby, PendingDraw, Stage, Table};
use crate::domain::player::Board;
use crate::domain::rules::{self, BOARD_SIZE};
use crate::errors::domain::{ConflictKind, DomainError, InfraErrorKind, ValidationKind};
use crate::services::deck_provider::DeckProvider;

#[derive(Clone)]
pub struct DeckCoordinator {
    provider: Arc<dyn DeckProvider>,
}

fn phase_mismatch(detail: impl Into<String>) -> DomainError {
    DomainError::validation(ValidationKind::PhaseMismatch, detail)
}

fn invalid_card(detail: impl Into<String>) -> DomainError {
    DomainError::validation(ValidationKind::InvalidCard, detail)
}

impl DeckCoordinator {
    pub fn new(provider: Arc<dyn DeckProvider>) -> Self {
        Self { provider }
    }

    /// Deals a round: fresh deck on the first deal, reshuffled deck after.
    ///
    /// Each player gets six face-down cards and three reveal moves, the next
    /// card starts the discard pile face-up and the host opens.
    pub async fn start_round(&self, lobby: &mut Lobby) -> Result<(), DomainError> {
        let seats = lobby.current_players();
        if seats == 0 {
            return Err(phase_mismatch("cannot deal to an empty lobby"));
        }

        let deck = match lobby.table() {
            Some(table) => self.provider.reshuffle(&table.deck.deck_id).await?,
            None => self.provider.create_deck(1).await?,
        };
        let wanted = rules::cards_to_deal(seats);
        let drawn = self.provider.draw(&deck.deck_id, wanted).await?;
        if drawn.cards.len() != wanted {
            return Err(DomainError::infra(
                InfraErrorKind::DeckUnavailable,
                format!("needed {wanted} cards, got {}", drawn.cards.len()),
            ));
        }

        let mut cards = drawn.cards.into_iter().map(Card::face_down);
        let mut boards = Vec::with_capacity(seats);
        for _ in 0..seats {
            let hand: Vec<Card> = cards.by_ref().take(BOARD_SIZE).collect();
            boards.push(Board::try_from(hand)?);
        }
        let starter = cards.next().map(Card::face_up).ok_or_else(|| {
            DomainError::infra(InfraErrorKind::DeckUnavailable, "no card left for discard")
        })?;

        for (player, board) in lobby.players.iter_mut().zip(boards) {
            player.deal(board);
        }

        lobby.stage = Stage::Playing(Table {
            deck: Deck::new(deck.deck_id, drawn.remaining),
            discard_pile: vec![starter],
            current_turn: lobby.host.clone(),
            player_started_last_turn: None,
            pending_draw: None,
            round_end_due: false,
        });

        info!(
            lobby_id = %lobby.id,
            round = lobby.current_round,
            players = seats,
            "Round dealt"
        );
        Ok(())
    }

    /// Draws one card into the actor's pending slot.
    pub async fn draw_one(&self, lobby: &mut Lobby, actor: &str) -> Result<Card, DomainError> {
        let (table, players) = lobby
            .playing_mut()
            .ok_or_else(|| phase_mismatch("no round in progress"))?;

        if rules::is_first_turn(players) {
            return Err(phase_mismatch("cannot draw during the first turn"));
        }
        rules::ensure_may_act(players, &table.current_turn, actor)?;
        if table.pending_draw.is_some() {
            return Err(DomainError::conflict(
                ConflictKind::DrawPending,
                "a drawn card is waiting to be placed",
            ));
        }

        let drawn = self.provider.draw(&table.deck.deck_id, 1).await?;
        let card = drawn.cards.into_iter().next().ok_or_else(|| {
            DomainError::infra(InfraErrorKind::DeckUnavailable, "provider returned no card")
        })?;

        table.deck.remaining = drawn.remaining;
        table.pending_draw = Some(PendingDraw {
            player_id: actor.to_string(),
            card: card.clone(),
        });
        debug!(actor, code = %card.code, remaining = drawn.remaining, "Card drawn");
        Ok(card)
    }

    /// Puts `drawn_code` face-up in place of `replace_code` on the actor's
    /// board. The drawn card must be the actor's pending draw or the top of
    /// the discard pile.
    pub fn replace(
        &self,
        lobby: &mut Lobby,
        actor: &str,
        drawn_code: &str,
        replace_code: &str,
    ) -> Result<(), DomainError> {
        let (table, players) = lobby
            .playing_mut()
            .ok_or_else(|| phase_mismatch("no round in progress"))?;

        let player = players
            .iter_mut()
            .find(|p| p.player_id == actor)
            .ok_or_else(|| {
                DomainError::validation(ValidationKind::InvalidPlayerId, "actor not seated")
            })?;
        if !player.holds(replace_code) {
            return Err(invalid_card(format!("{replace_code} is not on the board")));
        }

        let from_pending = table.pending_for(actor).is_some_and(|c| c.code == drawn_code);
        let card = if from_pending {
            table
                .pending_draw
                .take()
                .map(|p| p.card)
                .ok_or_else(|| invalid_card("pending draw vanished"))?
        } else if table.pending_for(actor).is_some() {
            return Err(invalid_card("a drawn card must be placed or discarded first"));
        } else if table.top_discard().is_some_and(|c| c.code == drawn_code) {
            table
                .discard_pile
                .pop()
                .ok_or_else(|| invalid_card("discard pile is empty"))?
        } else {
            return Err(invalid_card(format!("{drawn_code} is not available to take")));
        };

        let board = player
            .cards
            .as_mut()
            .ok_or_else(|| phase_mismatch("player has no board"))?;
        let old = board
            .swap(replace_code, card)
            .ok_or_else(|| invalid_card(format!("{replace_code} is not on the board")))?;
        player.recompute_score();
        table.push_discard(old);
        // The taken card is on a board now; no copy may stay in the pile.
        table.discard_pile.retain(|c| c.code != drawn_code);
        Ok(())
    }

    /// Sends the actor's pending draw to the discard pile.
    pub fn discard(&self, lobby: &mut Lobby, actor: &str, code: &str) -> Result<(), DomainError> {
        let (table, _) = lobby
            .playing_mut()
            .ok_or_else(|| phase_mismatch("no round in progress"))?;
        match table.pending_for(actor) {
            Some(card) if card.code == code => {}
            Some(_) => return Err(invalid_card(format!("{code} is not the drawn card"))),
            None => return Err(phase_mismatch("nothing drawn to discard")),
        }
        if let Some(pending) = table.pending_draw.take() {
            table.push_discard(pending.card);
        }
        Ok(())
    }

    /// Hands the lobby's deck back to the provider once the lobby is gone.
    pub async fn release(&self, lobby: &Lobby) {
        if let Some(table) = lobby.table() {
            self.provider.release(&table.deck.deck_id).await;
        }
    }

    /// Shuffles every card back into the lobby's deck.
    pub async fn reshuffle(&self, lobby: &mut Lobby) -> Result<(), DomainError> {
        let Some(deck_id) = lobby.table().map(|t| t.deck.deck_id.clone()) else {
            return Ok(());
        };
        let deck = self.provider.reshuffle(&deck_id).await?;
        if let Some(table) = lobby.table_mut() {
            table.deck.remaining = deck.remaining;
        }
        Ok(())
    }
}
