//! Handlers for client intents other than attacks.
//!
//! Failed preconditions are silent: the handler returns without touching the
//! world and the client is not told.

use crate::entity::Structure;
use crate::game::GameState;
use crate::physics::Vec2;
use shared::{MoveKeys, Recipe, StructureKind, BUILD_RANGE, CHAT_DURATION, PLAYER_SPEED};

/// Converts held direction keys into a velocity. Opposite keys cancel out.
pub fn movement_velocity(keys: MoveKeys) -> Vec2 {
    let mut direction = Vec2::ZERO;
    if keys.up {
        direction.y -= 1.0;
    }
    if keys.down {
        direction.y += 1.0;
    }
    if keys.left {
        direction.x -= 1.0;
    }
    if keys.right {
        direction.x += 1.0;
    }
    direction.normalize().scale(PLAYER_SPEED)
}

impl GameState {
    /// Stores the movement intent. Position changes on the next tick.
    pub fn set_movement(&mut self, player_id: u32, keys: MoveKeys) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.velocity = movement_velocity(keys);
        }
    }

    /// Crafts `recipe` if the inventory covers its cost. Returns whether the
    /// weapon changed hands.
    pub fn craft(&mut self, player_id: u32, recipe: &str) -> bool {
        let Ok(recipe) = recipe.parse::<Recipe>() else {
            return false;
        };
        let Some(player) = self.players.get_mut(&player_id) else {
            return false;
        };

        if !player.inventory.try_spend(&recipe.cost()) {
            return false;
        }
        player.weapon = recipe.output();
        true
    }

    /// Places a structure near the builder. The requested position must be
    /// within build range of the builder and the cost must be covered.
    pub fn build(&mut self, player_id: u32, kind: StructureKind, position: Vec2) -> Option<u32> {
        if !position.is_finite() {
            return None;
        }
        let player = self.players.get_mut(&player_id)?;

        if player.position.distance_sq(&position) > BUILD_RANGE * BUILD_RANGE {
            return None;
        }
        if !player.inventory.try_spend(&kind.cost()) {
            return None;
        }

        Some(self.insert_structure(|id| Structure::new(id, kind, position, player_id)))
    }

    /// Sets the player's chat bubble after sanitizing and filtering the text.
    /// Text that is empty after sanitizing is dropped.
    pub fn chat(&mut self, player_id: u32, text: &str) -> bool {
        let filtered = self.chat_filter.filter(&sanitize_chat(text));
        if filtered.is_empty() {
            return false;
        }

        let expires_at = self.clock + CHAT_DURATION;
        let Some(player) = self.players.get_mut(&player_id) else {
            return false;
        };
        player.chat = Some(filtered);
        player.chat_expires_at = Some(expires_at);
        true
    }
}

/// Strips line breaks and anything outside printable ASCII, trims, and
/// truncates to [`shared::CHAT_MAX_LEN`] characters.
pub fn sanitize_chat(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect();

    cleaned.trim().chars().take(shared::CHAT_MAX_LEN).collect()
}
